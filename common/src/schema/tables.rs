/// one table of the ipl dataset, first column is the primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl TableDef {
    /// `Name(Col_1, Col_2, ...)`, the notation the prompts use
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.columns.join(", "))
    }
}

pub const IPL_TABLES: &[TableDef] = &[
    TableDef {
        name: "Match",
        columns: &[
            "Match_Id",
            "Team_1",
            "Team_2",
            "Match_Date",
            "Season_Id",
            "Venue_Id",
            "Toss_Winner",
            "Toss_Decide",
            "Win_Type",
            "Win_Margin",
            "Outcome_Id",
            "Match_Winner",
            "Man_Of_The_Match",
        ],
    },
    TableDef {
        name: "Player",
        columns: &[
            "Player_Id",
            "Player_Name",
            "DOB",
            "Bowling_skill",
            "Batting_hand",
            "Country_Name",
        ],
    },
    TableDef {
        name: "Player_Match",
        columns: &["Match_Id", "Player_Id", "Role_Id", "Team_Id"],
    },
    TableDef {
        name: "Role",
        columns: &["Role_Id", "Role_Desc"],
    },
    TableDef {
        name: "Team",
        columns: &["Team_Id", "Team_Name"],
    },
    TableDef {
        name: "Ball_by_Ball",
        columns: &[
            "Match_Id",
            "Over_Id",
            "Ball_Id",
            "Innings_No",
            "Team_Batting",
            "Team_Bowling",
            "Striker_Batting_Position",
            "Striker",
            "Non_Striker",
            "Bowler",
        ],
    },
    TableDef {
        name: "Batsman_Scored",
        columns: &["Match_Id", "Over_Id", "Ball_Id", "Runs_Scored", "Innings_No"],
    },
    TableDef {
        name: "Wicket_Taken",
        columns: &[
            "Match_Id",
            "Over_Id",
            "Ball_Id",
            "Player_Out",
            "Kind_Out",
            "Fielders",
            "Innings_No",
        ],
    },
    TableDef {
        name: "Out_Type",
        columns: &["Out_Id", "Out_Name"],
    },
    TableDef {
        name: "Venue",
        columns: &["Venue_Id", "Venue_Name", "City_Id"],
    },
    TableDef {
        name: "City",
        columns: &["City_Id", "City_Name", "Country_Id"],
    },
    TableDef {
        name: "Country",
        columns: &["Country_Id", "Country_Name"],
    },
    TableDef {
        name: "Toss_Decision",
        columns: &["Toss_Id", "Toss_Name"],
    },
    TableDef {
        name: "Outcome",
        columns: &["Outcome_Id", "Outcome_Type"],
    },
    TableDef {
        name: "Umpire",
        columns: &["Umpire_Id", "Umpire_Name", "Umpire_Country"],
    },
    TableDef {
        name: "Season",
        columns: &["Season_Id", "Season_Year"],
    },
    TableDef {
        name: "Batting_Style",
        columns: &["Batting_Id", "Batting_hand"],
    },
    TableDef {
        name: "Bowling_Style",
        columns: &["Bowling_Id", "Bowling_skill"],
    },
    TableDef {
        name: "Win_By",
        columns: &["Win_Id", "Win_Type"],
    },
    TableDef {
        name: "Extra_Type",
        columns: &["Extra_Id", "Extra_Name"],
    },
    TableDef {
        name: "Extra_Runs",
        columns: &[
            "Match_Id",
            "Over_Id",
            "Ball_Id",
            "Extra_Id",
            "Extra_Runs",
            "Innings_No",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_format() {
        let role = IPL_TABLES.iter().find(|t| t.name == "Role").unwrap();
        assert_eq!(role.signature(), "Role(Role_Id, Role_Desc)");
    }

    #[test]
    fn test_table_names_are_unique() {
        let mut names: Vec<_> = IPL_TABLES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), IPL_TABLES.len());
        assert_eq!(IPL_TABLES.len(), 21);
    }
}

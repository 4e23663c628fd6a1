use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cmd;
mod server;

use clap::Parser;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine, the variables may come from the environment
    let _ = dotenvy::dotenv();

    let args = cmd::Cli::parse();
    args.execute().await
}

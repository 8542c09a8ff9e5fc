use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = linktrace_api::Args::parse();

	linktrace_api::run(args).await
}

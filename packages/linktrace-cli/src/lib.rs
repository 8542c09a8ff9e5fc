use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};

/// Release version tagged with the product name, shown by `--version`.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (linktrace)");

/// Help output palette shared by every linktrace binary.
pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD | Effects::UNDERLINE)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
		.valid(AnsiColor::Green.on_default())
		.invalid(AnsiColor::Red.on_default())
}

#[cfg(test)]
mod tests {
	use clap::Command;

	use super::{VERSION, styles};

	#[test]
	fn version_carries_package_version() {
		assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
		assert!(VERSION.ends_with("(linktrace)"));
	}

	#[test]
	fn styled_command_renders_help() {
		let mut cmd = Command::new("linktrace-api").version(VERSION).styles(styles());
		let help = cmd.render_help().to_string();

		assert!(help.contains("Usage"));
	}
}

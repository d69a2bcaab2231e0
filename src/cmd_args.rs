use std::ffi::OsString;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct ClapArgs {
    /// Initial search query
    /// Optional. When given, the catalog is searched as soon as the screen opens.
    #[clap(help = "initial search query")]
    query: Option<String>,

    /// Profile name
    /// Section of the profile file holding the catalog settings. Default is 'default'.
    /// If the profile is not configured, built-in defaults are used.
    #[clap(short = 'p', long, default_value = "default", help = "profile name")]
    profile: String,

    /// Verbose mode
    /// Optional. Log debug messages to stderr.
    #[clap(
        short = 'v',
        long,
        help = "Print verbose message",
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    query: Option<String>,
    profile: String,
    verbose: bool,
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        Self::from_clap(ClapArgs::parse())
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_clap(ClapArgs::parse_from(itr))
    }

    fn from_clap(args: ClapArgs) -> Self {
        Self {
            query: args
                .query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            profile: args.profile,
            verbose: args.verbose,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn profile(&self) -> &String {
        &self.profile
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_args_profile_only() {
        let args = CommandLineArgs::parse_from(["program", "--profile", "test"]);
        assert_eq!(args.profile(), "test");
        assert!(!args.verbose());
        assert_eq!(args.query(), None);
    }

    #[test]
    fn test_parse_args_verbose() {
        let args = CommandLineArgs::parse_from(["program", "--verbose"]);
        assert_eq!(args.profile(), "default");
        assert!(args.verbose());
    }

    #[test]
    fn test_parse_args_short_flags() {
        let args = CommandLineArgs::parse_from(["program", "-p", "dev", "-v"]);
        assert_eq!(args.profile(), "dev");
        assert!(args.verbose());
    }

    #[test]
    fn test_parse_args_initial_query() {
        let args = CommandLineArgs::parse_from(["program", "phone", "-p", "dev"]);
        assert_eq!(args.query(), Some("phone"));
        assert_eq!(args.profile(), "dev");
    }

    #[test]
    fn test_blank_query_is_dropped() {
        let args = CommandLineArgs::parse_from(["program", "   "]);
        assert_eq!(args.query(), None);
    }

    #[test]
    fn test_default_values() {
        let args = CommandLineArgs::parse_from(["program"]);
        assert_eq!(args.profile(), "default");
        assert!(!args.verbose());
        assert_eq!(args.query(), None);
    }
}

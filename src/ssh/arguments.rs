//! SSH client argument builder
//!
//! [`Arguments`] holds two families of SSH client arguments:
//!
//! - flags, either boolean (`-A`) or value-bearing (`-p 2222`)
//! - options, always rendered as `-o Name=value`
//!
//! Every `with_*` method returns a new value and leaves the receiver untouched,
//! so a base set can be shared and specialised per host.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::control_path::generate_control_path;
use super::host::HostDescriptor;
use crate::error::Result;

/// `ControlPersist` value applied by [`Arguments::with_multiplexing`]
pub const DEFAULT_CONTROL_PERSIST: &str = "60";

/// A single flag entry passed to [`Arguments::with_flags`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    /// Flag without a value, e.g. `-A`
    Bool(String),
    /// Flag followed by a value, e.g. `-p 2222`
    Value(String, String),
}

impl Flag {
    /// Create a boolean flag
    pub fn bool(name: impl Into<String>) -> Self {
        Flag::Bool(name.into())
    }

    /// Create a value flag
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Flag::Value(name.into(), value.into())
    }

    /// Flag name as rendered on the command line
    pub fn name(&self) -> &str {
        match self {
            Flag::Bool(name) | Flag::Value(name, _) => name,
        }
    }

    fn into_entry(self) -> (String, Option<String>) {
        match self {
            Flag::Bool(name) => (name, None),
            Flag::Value(name, value) => (name, Some(value)),
        }
    }
}

impl From<&str> for Flag {
    fn from(name: &str) -> Self {
        Flag::bool(name)
    }
}

impl From<String> for Flag {
    fn from(name: String) -> Self {
        Flag::Bool(name)
    }
}

impl From<(&str, &str)> for Flag {
    fn from((name, value): (&str, &str)) -> Self {
        Flag::value(name, value)
    }
}

impl From<(String, String)> for Flag {
    fn from((name, value): (String, String)) -> Self {
        Flag::Value(name, value)
    }
}

impl From<(&str, Option<&str>)> for Flag {
    fn from((name, value): (&str, Option<&str>)) -> Self {
        match value {
            Some(value) => Flag::value(name, value),
            None => Flag::bool(name),
        }
    }
}

/// Result of looking up a flag with [`Arguments::get_flag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue<'a> {
    /// The flag is not configured
    Absent,
    /// The flag is configured as a boolean flag
    Set,
    /// The flag is configured with a value
    Value(&'a str),
}

impl<'a> FlagValue<'a> {
    /// Whether the flag is configured at all
    pub fn is_set(&self) -> bool {
        !matches!(self, FlagValue::Absent)
    }

    /// The flag's value, if it carries one
    pub fn value(&self) -> Option<&'a str> {
        match *self {
            FlagValue::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Insertion-ordered map with unique keys.
///
/// Overwriting a key keeps its original position, which keeps the rendered
/// command line stable when defaults are layered underneath.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArgMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for ArgMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V: Clone> ArgMap<V> {
    fn insert(&mut self, key: String, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `base` overlaid by `self`: keys present in both resolve to `self`
    fn overlaid_on(&self, base: &ArgMap<V>) -> ArgMap<V> {
        let mut merged = base.clone();
        for (key, value) in &self.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl<V: Clone> FromIterator<(String, V)> for ArgMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = ArgMap::default();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for ArgMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de> + Clone> Deserialize<'de> for ArgMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ArgMapVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de> + Clone> Visitor<'de> for ArgMapVisitor<V> {
            type Value = ArgMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of argument names to values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = ArgMap::default();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ArgMapVisitor(std::marker::PhantomData))
    }
}

/// Immutable set of SSH client flags and `-o` options
///
/// # Examples
///
/// ```
/// use ssh_args::ssh::{Arguments, Flag};
///
/// let args = Arguments::new()
///     .with_flags([Flag::bool("-A"), Flag::value("-p", "2222")])
///     .with_option("StrictHostKeyChecking", "no");
///
/// assert_eq!(args.to_cli_string(), "-A -p 2222 -o StrictHostKeyChecking=no");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    /// Flag name to optional value (`None` = boolean flag)
    #[serde(default)]
    flags: ArgMap<Option<String>>,

    /// Option name to value, rendered as `-o name=value`
    #[serde(default)]
    options: ArgMap<String>,
}

impl Arguments {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all flags with `flags`
    ///
    /// Entries are [`Flag`]s or anything convertible into one: a bare name is a
    /// boolean flag, a `(name, value)` pair is a value flag and a
    /// `(name, None)` pair is a boolean flag. Prior flags are discarded.
    pub fn with_flags<I, F>(&self, flags: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Flag>,
    {
        Self {
            flags: flags.into_iter().map(|f| Flag::into_entry(f.into())).collect(),
            options: self.options.clone(),
        }
    }

    /// Replace all options with `options`. Prior options are discarded.
    pub fn with_options<I, K, V>(&self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            flags: self.flags.clone(),
            options: options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a single flag, overwriting any existing entry with the same name
    pub fn with_flag(&self, name: impl Into<String>, value: Option<&str>) -> Self {
        let mut clone = self.clone();
        clone.flags.insert(name.into(), value.map(str::to_string));
        clone
    }

    /// Set a single option, overwriting any existing entry with the same name
    pub fn with_option(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut clone = self.clone();
        clone.options.insert(name.into(), value.into());
        clone
    }

    /// Layer `defaults` underneath this set.
    ///
    /// Keys present in both resolve to this set's value.
    pub fn with_defaults(&self, defaults: &Arguments) -> Self {
        Self {
            flags: self.flags.overlaid_on(&defaults.flags),
            options: self.options.overlaid_on(&defaults.options),
        }
    }

    /// Add connection multiplexing defaults for `host`:
    /// `ControlMaster=auto`, `ControlPersist=60` and a derived `ControlPath`.
    ///
    /// Options already set on this instance take precedence.
    ///
    /// # Returns
    /// * `Ok(Arguments)` - The set with multiplexing defaults applied
    /// * `Err(SshArgsError::ControlPathTooLong)` - If no control path fits the socket limit
    pub fn with_multiplexing(&self, host: &impl HostDescriptor) -> Result<Self> {
        let control_path = generate_control_path(host)?;
        debug!(
            "Multiplexing {}:{} via {}",
            host.identifier(),
            host.port(),
            control_path
        );

        let multiplex_defaults = Arguments::new().with_options([
            ("ControlMaster", "auto".to_string()),
            ("ControlPersist", DEFAULT_CONTROL_PERSIST.to_string()),
            ("ControlPath", control_path),
        ]);

        Ok(self.with_defaults(&multiplex_defaults))
    }

    /// Look up a flag
    pub fn get_flag(&self, name: &str) -> FlagValue<'_> {
        match self.flags.get(name) {
            None => FlagValue::Absent,
            Some(None) => FlagValue::Set,
            Some(Some(value)) => FlagValue::Value(value),
        }
    }

    /// Look up an option, returning an empty string if it is not set
    pub fn get_option(&self, name: &str) -> &str {
        self.options.get(name).map(String::as_str).unwrap_or("")
    }

    /// Iterate over flags in order as `(name, value)`
    pub fn flags(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.flags.iter().map(|(k, v)| (k, v.as_deref()))
    }

    /// Iterate over options in order as `(name, value)`
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Number of flags and options
    pub fn len(&self) -> usize {
        self.flags.len() + self.options.len()
    }

    /// Whether no flags or options are set
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.options.is_empty()
    }

    /// Value flags that are rendered. A blank value would leave the flag
    /// bare and make ssh consume the next token as its argument, so those
    /// are skipped.
    fn value_flags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.flags()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .filter(|(_, value)| !value.trim().is_empty())
    }

    /// Pretty-printed JSON in the form read back by
    /// [`parse_defaults`](super::defaults::parse_defaults)
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render as a single command-line fragment.
    ///
    /// Boolean flags come first, then value flags, then options. Runs of
    /// whitespace are collapsed to one space and the result is trimmed. No
    /// shell escaping is applied.
    pub fn to_cli_string(&self) -> String {
        let bool_flags: Vec<&str> = self
            .flags()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect();

        let value_flags: Vec<String> = self
            .value_flags()
            .map(|(name, value)| format!("{} {}", name, value))
            .collect();

        let options: Vec<String> = self
            .options()
            .map(|(name, value)| format!("-o {}={}", name, value))
            .collect();

        let args = format!(
            "{} {} {}",
            bool_flags.join(" "),
            value_flags.join(" "),
            options.join(" ")
        );

        args.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Render as separate argv tokens in the same order as
    /// [`to_cli_string`](Self::to_cli_string), for passing to a process
    /// builder without going through a shell.
    pub fn to_cli_tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.flags.len() + self.options.len() * 2);

        tokens.extend(
            self.flags()
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| name.to_string()),
        );

        for (name, value) in self.value_flags() {
            tokens.push(name.to_string());
            tokens.push(value.to_string());
        }

        for (name, value) in self.options() {
            tokens.push("-o".to_string());
            tokens.push(format!("{}={}", name, value));
        }

        tokens
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cli_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh::control_path::MAX_CONTROL_PATH_LEN;
    use crate::ssh::host::Host;

    #[test]
    fn test_empty_renders_empty_string() {
        let args = Arguments::new();
        assert_eq!(args.to_cli_string(), "");
        assert!(args.is_empty());
        assert!(args.to_cli_tokens().is_empty());
    }

    #[test]
    fn test_bool_and_value_flags() {
        let args = Arguments::new().with_flags([Flag::bool("-A"), Flag::value("-p", "2222")]);

        assert_eq!(args.get_flag("-A"), FlagValue::Set);
        assert_eq!(args.get_flag("-p"), FlagValue::Value("2222"));
        assert_eq!(args.to_cli_string(), "-A -p 2222");
    }

    #[test]
    fn test_bool_flags_rendered_before_value_flags() {
        let args = Arguments::new()
            .with_flag("-p", Some("2222"))
            .with_flag("-A", None)
            .with_flag("-i", Some("~/.ssh/id_ed25519"))
            .with_flag("-T", None);

        assert_eq!(args.to_cli_string(), "-A -T -p 2222 -i ~/.ssh/id_ed25519");
    }

    #[test]
    fn test_flag_conversions() {
        let args = Arguments::new().with_flags(vec![
            Flag::from("-A"),
            Flag::from(("-p", "22")),
            Flag::from(("-q", None::<&str>)),
            Flag::from(("-l", Some("deploy"))),
        ]);

        assert_eq!(args.get_flag("-A"), FlagValue::Set);
        assert_eq!(args.get_flag("-q"), FlagValue::Set);
        assert_eq!(args.get_flag("-p").value(), Some("22"));
        assert_eq!(args.get_flag("-l").value(), Some("deploy"));
    }

    #[test]
    fn test_with_flags_replaces_prior_flags() {
        let args = Arguments::new()
            .with_flag("-A", None)
            .with_flags(["-T"]);

        assert_eq!(args.get_flag("-A"), FlagValue::Absent);
        assert_eq!(args.get_flag("-T"), FlagValue::Set);
    }

    #[test]
    fn test_with_options_replaces_prior_options() {
        let args = Arguments::new()
            .with_option("ControlMaster", "auto")
            .with_options([("ServerAliveInterval", "30")]);

        assert_eq!(args.get_option("ControlMaster"), "");
        assert_eq!(args.get_option("ServerAliveInterval"), "30");
    }

    #[test]
    fn test_option_rendering() {
        let args = Arguments::new().with_option("StrictHostKeyChecking", "no");
        assert_eq!(args.to_cli_string(), "-o StrictHostKeyChecking=no");
        assert_eq!(args.to_string(), "-o StrictHostKeyChecking=no");
    }

    #[test]
    fn test_later_write_wins_and_keeps_position() {
        let args = Arguments::new()
            .with_option("A", "1")
            .with_option("B", "2")
            .with_option("A", "3");

        assert_eq!(args.to_cli_string(), "-o A=3 -o B=2");
    }

    #[test]
    fn test_flag_can_switch_between_bool_and_value() {
        let args = Arguments::new()
            .with_flag("-p", None)
            .with_flag("-p", Some("2200"));

        assert_eq!(args.get_flag("-p"), FlagValue::Value("2200"));
        assert_eq!(args.to_cli_string(), "-p 2200");
    }

    #[test]
    fn test_missing_lookups() {
        let args = Arguments::new();
        assert_eq!(args.get_option("Nonexistent"), "");
        assert_eq!(args.get_flag("Nonexistent"), FlagValue::Absent);
        assert!(!args.get_flag("Nonexistent").is_set());
        assert_eq!(args.get_flag("Nonexistent").value(), None);
    }

    #[test]
    fn test_receiver_is_not_modified() {
        let base = Arguments::new()
            .with_flag("-A", None)
            .with_option("User", "deploy");
        let snapshot = base.clone();

        let _ = base.with_flag("-p", Some("22"));
        let _ = base.with_option("User", "root");
        let _ = base.with_flags(["-T"]);
        let _ = base.with_options([("Port", "22")]);
        let _ = base.with_defaults(&Arguments::new().with_option("Port", "2222"));
        let _ = base.with_multiplexing(&Host::new("web")).unwrap();

        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_with_defaults_precedence() {
        let defaults = Arguments::new()
            .with_flags([Flag::bool("-A"), Flag::value("-p", "22")])
            .with_options([("User", "deploy"), ("Compression", "yes")]);
        let args = Arguments::new()
            .with_flag("-p", Some("2222"))
            .with_option("User", "root")
            .with_defaults(&defaults);

        assert_eq!(args.get_flag("-A"), FlagValue::Set);
        assert_eq!(args.get_flag("-p"), FlagValue::Value("2222"));
        assert_eq!(args.get_option("User"), "root");
        assert_eq!(args.get_option("Compression"), "yes");
        assert_eq!(
            args.to_cli_string(),
            "-A -p 2222 -o User=root -o Compression=yes"
        );
    }

    #[test]
    fn test_with_defaults_appends_own_keys_after_defaults() {
        let defaults = Arguments::new().with_option("B", "default");
        let args = Arguments::new()
            .with_option("A", "mine")
            .with_defaults(&defaults);

        assert_eq!(args.to_cli_string(), "-o B=default -o A=mine");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let args = Arguments::new()
            .with_flag("-A", None)
            .with_option("ProxyCommand", "ssh  -W   %h:%p bastion");
        let cli = args.to_cli_string();

        assert_eq!(cli, "-A -o ProxyCommand=ssh -W %h:%p bastion");
        assert!(!cli.contains("  "));
    }

    #[test]
    fn test_no_double_spaces_for_any_combination() {
        let flagsets = [
            Arguments::new(),
            Arguments::new().with_flags(["-A"]),
            Arguments::new().with_flags([Flag::value("-p", "22")]),
            Arguments::new().with_flags([Flag::bool("-A"), Flag::value("-p", "22")]),
        ];

        for base in &flagsets {
            for options in [vec![], vec![("User", "deploy")]] {
                let cli = base.with_options(options).to_cli_string();
                assert!(!cli.contains("  "), "{:?}", cli);
                assert_eq!(cli, cli.trim());
            }
        }
    }

    #[test]
    fn test_blank_value_flag_is_skipped() {
        let args = Arguments::new()
            .with_flag("-p", Some(""))
            .with_flag("-l", Some(" "))
            .with_option("User", "x");

        assert_eq!(args.to_cli_string(), "-o User=x");
        assert_eq!(args.to_cli_tokens(), vec!["-o", "User=x"]);
        assert_eq!(args.get_flag("-p"), FlagValue::Value(""));
    }

    #[test]
    fn test_zero_value_flag_is_rendered() {
        let args = Arguments::new()
            .with_flag("-C", Some("0"))
            .with_option("User", "x");

        assert_eq!(args.to_cli_string(), "-C 0 -o User=x");
        assert_eq!(args.to_cli_tokens(), vec!["-C", "0", "-o", "User=x"]);
    }

    #[test]
    fn test_cli_tokens() {
        let args = Arguments::new()
            .with_flags([Flag::value("-p", "2222"), Flag::bool("-A")])
            .with_option("ControlPersist", "60");

        assert_eq!(
            args.to_cli_tokens(),
            vec!["-A", "-p", "2222", "-o", "ControlPersist=60"]
        );
    }

    #[test]
    fn test_with_multiplexing_adds_defaults() {
        let args = Arguments::new()
            .with_multiplexing(&Host::new("prod-web-01"))
            .unwrap();

        assert_eq!(args.get_option("ControlMaster"), "auto");
        assert_eq!(args.get_option("ControlPersist"), "60");
        assert_eq!(
            args.get_option("ControlPath"),
            "~/.ssh/deployer_mux_prod-web-0122"
        );
        assert_eq!(
            args.to_cli_string(),
            "-o ControlMaster=auto -o ControlPersist=60 -o ControlPath=~/.ssh/deployer_mux_prod-web-0122"
        );
    }

    #[test]
    fn test_with_multiplexing_caller_options_win() {
        let args = Arguments::new()
            .with_option("ControlPersist", "600")
            .with_option("ControlPath", "/tmp/cm-%C")
            .with_multiplexing(&Host::new("db").with_port(2200))
            .unwrap();

        assert_eq!(args.get_option("ControlMaster"), "auto");
        assert_eq!(args.get_option("ControlPersist"), "600");
        assert_eq!(args.get_option("ControlPath"), "/tmp/cm-%C");
    }

    #[test]
    fn test_with_multiplexing_long_host_uses_hash() {
        let host = Host::new("a".repeat(MAX_CONTROL_PATH_LEN));
        let args = Arguments::new().with_multiplexing(&host).unwrap();
        assert_eq!(args.get_option("ControlPath"), "~/.ssh/deployer_mux_%C");
    }

    #[test]
    fn test_serde_roundtrip_keeps_order() {
        let json = r#"{"flags":{"-p":"2222","-A":null},"options":{"User":"deploy","Compression":"yes"}}"#;
        let args: Arguments = serde_json::from_str(json).unwrap();

        assert_eq!(args.get_flag("-A"), FlagValue::Set);
        assert_eq!(
            args.to_cli_string(),
            "-A -p 2222 -o User=deploy -o Compression=yes"
        );
        assert_eq!(serde_json::to_string(&args).unwrap(), json);
    }

    #[test]
    fn test_to_json_is_readable_as_defaults() {
        let args = Arguments::new()
            .with_flags([Flag::bool("-A"), Flag::value("-p", "2222")])
            .with_option("User", "deploy");

        let json = args.to_json().unwrap();
        assert!(json.contains("\"-A\": null"));
        assert_eq!(crate::ssh::parse_defaults(&json).unwrap(), args);
    }

    #[test]
    fn test_serde_missing_sections_default_to_empty() {
        let args: Arguments = serde_json::from_str(r#"{"options":{"Port":"22"}}"#).unwrap();
        assert_eq!(args.flags().count(), 0);
        assert_eq!(args.get_option("Port"), "22");
    }
}

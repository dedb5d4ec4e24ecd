//! Provider profile registry
//!
//! Compiled-in tuning presets, one per network operator. Lookups never fail:
//! an unknown or misspelled provider resolves to the `Auto` profile.

use once_cell::sync::Lazy;
use serde::Serialize;

/// Name of the profile every unknown provider falls back to
pub const DEFAULT_PROVIDER: &str = "Auto";

/// Method used wherever a list would otherwise end up empty
pub const FALLBACK_METHOD: &str = "fake";

/// Tuning preset for a single provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderProfile {
    /// Canonical provider name
    pub name: String,
    /// Alternative spellings accepted by lookup
    pub aliases: Vec<String>,
    /// Primary desync methods
    pub desync_methods: Vec<String>,
    /// Base repeat count
    pub repeats: u32,
    /// Add `--dpi-desync-fooling=ts` where the block allows it
    pub use_fooling: bool,
    /// Add `--ip-id=zero` to the Google block
    pub use_ip_id: bool,
    /// Provider wants the extended rule set
    pub extra_rules: bool,
    /// Methods for the Google/YouTube block
    pub google_methods: Vec<String>,
    /// Repeats for the Google/YouTube block
    pub google_repeats: u32,
    /// Methods for ordinary sites
    pub general_methods: Vec<String>,
    /// Repeats for ordinary sites
    pub general_repeats: u32,
    /// Methods for the games block
    pub games_methods: Vec<String>,
    /// Repeats for the games block
    pub games_repeats: u32,
}

impl ProviderProfile {
    /// Whether `name` refers to this profile (case-insensitive, aliases included)
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_lowercase() == name.to_lowercase())
    }

    /// Multi-line summary of the category method lists
    pub fn describe(&self) -> String {
        format!(
            "Provider: {}\nGeneral sites: {}\nGoogle/YouTube: {}\nGames: {}\n",
            self.name,
            self.general_methods.join(", "),
            self.google_methods.join(", "),
            self.games_methods.join(", "),
        )
    }
}

/// Replace an empty method list with the single fallback method
pub(crate) fn non_empty(methods: Vec<String>) -> Vec<String> {
    if methods.is_empty() {
        vec![FALLBACK_METHOD.to_string()]
    } else {
        methods
    }
}

struct Preset {
    name: &'static str,
    aliases: &'static [&'static str],
    desync: &'static [&'static str],
    repeats: u32,
    fooling: bool,
    ip_id: bool,
    extra_rules: bool,
    google: (&'static [&'static str], u32),
    general: (&'static [&'static str], u32),
    games: (&'static [&'static str], u32),
}

impl Preset {
    fn build(&self) -> ProviderProfile {
        let list = |methods: &[&str]| non_empty(methods.iter().map(|m| (*m).to_string()).collect());

        ProviderProfile {
            name: self.name.to_string(),
            aliases: self.aliases.iter().map(|a| (*a).to_string()).collect(),
            desync_methods: list(self.desync),
            repeats: self.repeats.max(1),
            use_fooling: self.fooling,
            use_ip_id: self.ip_id,
            extra_rules: self.extra_rules,
            google_methods: list(self.google.0),
            google_repeats: self.google.1.max(1),
            general_methods: list(self.general.0),
            general_repeats: self.general.1.max(1),
            games_methods: list(self.games.0),
            games_repeats: self.games.1.max(1),
        }
    }
}

const PRESETS: &[Preset] = &[
    Preset {
        name: DEFAULT_PROVIDER,
        aliases: &["Авто", "default"],
        desync: &["fake", "split2"],
        repeats: 2,
        fooling: true,
        ip_id: false,
        extra_rules: false,
        google: (&["fake", "fakedsplit"], 3),
        general: (&["fake"], 1),
        games: (&["split2"], 2),
    },
    Preset {
        name: "Rostelecom",
        aliases: &["Ростелеком", "rtk"],
        desync: &["fake", "split2"],
        repeats: 3,
        fooling: true,
        ip_id: false,
        extra_rules: true,
        google: (&["fake", "fakedsplit", "split2"], 4),
        general: (&["fake"], 1),
        games: (&["split2", "fakedsplit"], 3),
    },
    Preset {
        name: "MTS",
        aliases: &["МТС"],
        desync: &["fake"],
        repeats: 2,
        fooling: false,
        ip_id: false,
        extra_rules: false,
        google: (&["fake", "fakedsplit"], 3),
        general: (&["fake"], 1),
        games: (&["fake"], 2),
    },
    Preset {
        name: "Beeline",
        aliases: &["Билайн"],
        desync: &["split2"],
        repeats: 2,
        fooling: true,
        ip_id: true,
        extra_rules: true,
        google: (&["split2", "fakedsplit"], 3),
        general: (&["split2"], 1),
        games: (&["split2", "multisplit"], 3),
    },
    Preset {
        name: "MegaFon",
        aliases: &["МегаФон"],
        desync: &["fake", "split2"],
        repeats: 2,
        fooling: true,
        ip_id: false,
        extra_rules: true,
        google: (&["fake", "split2", "fakedsplit"], 3),
        general: (&["fake"], 1),
        games: (&["split2"], 2),
    },
    Preset {
        name: "DomRu",
        aliases: &["Дом.ру", "dom.ru"],
        desync: &["fake"],
        repeats: 2,
        fooling: true,
        ip_id: false,
        extra_rules: false,
        google: (&["fake", "fakedsplit"], 3),
        general: (&["fake"], 1),
        games: (&["fake"], 2),
    },
    Preset {
        name: "TTK",
        aliases: &["ТТК"],
        desync: &["fake"],
        repeats: 2,
        fooling: true,
        ip_id: false,
        extra_rules: true,
        google: (&["fake", "fakedsplit"], 3),
        general: (&["fake"], 1),
        games: (&["fake", "split2"], 2),
    },
];

static REGISTRY: Lazy<Vec<ProviderProfile>> = Lazy::new(|| PRESETS.iter().map(Preset::build).collect());

/// All known profiles, default first
pub fn all() -> &'static [ProviderProfile] {
    &REGISTRY
}

/// Exact lookup without fallback
pub fn find(name: &str) -> Option<&'static ProviderProfile> {
    REGISTRY.iter().find(|profile| profile.matches(name))
}

/// Resolve a provider name, falling back to the default profile
pub fn lookup(name: &str) -> &'static ProviderProfile {
    match find(name) {
        Some(profile) => profile,
        None => {
            tracing::debug!(provider = name, "Unknown provider, using {}", DEFAULT_PROVIDER);
            default_profile()
        }
    }
}

/// The `Auto` profile
pub fn default_profile() -> &'static ProviderProfile {
    &REGISTRY[0]
}

/// Canonical names of every registered provider
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|profile| profile.name.as_str()).collect()
}

//! Aggressiveness modes and the profile transform
//!
//! Each mode has its own transform function; [`apply`] dispatches on the
//! enum and always works on a copy of the registry profile.

use crate::error::{Error, Result};
use crate::provider::{non_empty, ProviderProfile};
use serde::{Deserialize, Serialize};

/// Google methods forced by [`Mode::Extreme`]
pub const EXTREME_GOOGLE_METHODS: &[&str] = &["fake", "fakedsplit", "split2", "multisplit"];

/// Games methods forced by [`Mode::Extreme`]
pub const EXTREME_GAMES_METHODS: &[&str] = &["split2", "multisplit", "fakedsplit"];

const MULTISPLIT: &str = "multisplit";

/// Aggressiveness level, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Mode {
    /// Provider tuning as given
    #[default]
    Optimized,
    /// One extra repeat, primary methods for general traffic
    Standard,
    /// Two extra repeats, `multisplit` for Google
    Aggressive,
    /// Fixed superset methods for Google and games
    Extreme,
}

impl Mode {
    /// All modes in severity order
    pub const ALL: [Mode; 4] = [Mode::Optimized, Mode::Standard, Mode::Aggressive, Mode::Extreme];

    /// Get mode name
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Optimized => "optimized",
            Mode::Standard => "standard",
            Mode::Aggressive => "aggressive",
            Mode::Extreme => "extreme",
        }
    }

    /// Get mode description
    pub fn description(&self) -> &'static str {
        match self {
            Mode::Optimized => "Provider tuning unchanged",
            Mode::Standard => "+1 repeat, primary methods for general sites",
            Mode::Aggressive => "+2 repeats, multisplit added for Google",
            Mode::Extreme => "Fixed superset methods for Google and games",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "optimized" | "optimised" | "оптимизированный" => Ok(Mode::Optimized),
            "2" | "standard" | "стандарт" => Ok(Mode::Standard),
            "3" | "aggressive" | "агрессив" => Ok(Mode::Aggressive),
            "4" | "extreme" | "экстрим" => Ok(Mode::Extreme),
            _ => Err(Error::config_value("mode", format!("Unknown mode: {s}"))),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Methods and repeat count for one traffic category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Desync {
    /// Ordered, non-empty method list
    pub methods: Vec<String>,
    /// Repeat count, at least 1
    pub repeats: u32,
}

impl Desync {
    /// Build a desync pair, guarding against empty lists and zero repeats
    pub fn new(methods: Vec<String>, repeats: u32) -> Self {
        Self {
            methods: non_empty(methods),
            repeats: repeats.max(1),
        }
    }

    /// First method of the list
    pub fn primary(&self) -> &str {
        self.methods
            .first()
            .map_or(crate::provider::FALLBACK_METHOD, String::as_str)
    }
}

/// A provider profile after the mode transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveProfile {
    /// Canonical provider name
    pub provider: String,
    /// Mode that produced this profile
    pub mode: Mode,
    /// General traffic
    pub base: Desync,
    /// Google/YouTube
    pub google: Desync,
    /// Games
    pub games: Desync,
    /// Fooling on the discord.media and Google blocks
    pub use_fooling: bool,
    /// Fooling on the games block
    pub games_fooling: bool,
    /// `--ip-id=zero` on the Google block
    pub use_ip_id: bool,
    /// Provider wants the extended rule set
    pub extra_rules: bool,
}

impl EffectiveProfile {
    /// Summary for display alongside [`ProviderProfile::describe`]
    pub fn describe(&self) -> String {
        format!(
            "Provider: {} ({})\nGeneral sites: {} x{}\nGoogle/YouTube: {} x{}\nGames: {} x{}\n",
            self.provider,
            self.mode,
            self.base.methods.join(", "),
            self.base.repeats,
            self.google.methods.join(", "),
            self.google.repeats,
            self.games.methods.join(", "),
            self.games.repeats,
        )
    }
}

/// Apply `mode` to a copy of `profile`
pub fn apply(profile: &ProviderProfile, mode: Mode) -> EffectiveProfile {
    let transform: fn(&ProviderProfile) -> Categories = match mode {
        Mode::Optimized => optimized,
        Mode::Standard => standard,
        Mode::Aggressive => aggressive,
        Mode::Extreme => extreme,
    };
    let categories = transform(profile);

    EffectiveProfile {
        provider: profile.name.clone(),
        mode,
        base: categories.base,
        google: categories.google,
        games: categories.games,
        use_fooling: profile.use_fooling,
        games_fooling: profile.use_fooling && mode != Mode::Optimized,
        use_ip_id: profile.use_ip_id,
        extra_rules: profile.extra_rules,
    }
}

struct Categories {
    base: Desync,
    google: Desync,
    games: Desync,
}

fn owned(methods: &[&str]) -> Vec<String> {
    methods.iter().map(|m| (*m).to_string()).collect()
}

fn optimized(p: &ProviderProfile) -> Categories {
    Categories {
        base: Desync::new(p.general_methods.clone(), p.repeats),
        google: Desync::new(p.google_methods.clone(), p.google_repeats),
        games: Desync::new(p.games_methods.clone(), p.games_repeats),
    }
}

fn standard(p: &ProviderProfile) -> Categories {
    Categories {
        base: Desync::new(p.desync_methods.clone(), p.repeats.saturating_add(1)),
        google: Desync::new(p.google_methods.clone(), p.google_repeats.saturating_add(1)),
        games: Desync::new(p.games_methods.clone(), p.games_repeats.saturating_add(1)),
    }
}

fn aggressive(p: &ProviderProfile) -> Categories {
    let mut google = p.google_methods.clone();
    if !google.iter().any(|m| m == MULTISPLIT) {
        google.push(MULTISPLIT.to_string());
    }

    Categories {
        base: Desync::new(p.desync_methods.clone(), p.repeats.saturating_add(2)),
        google: Desync::new(google, p.google_repeats.saturating_add(2)),
        games: Desync::new(p.games_methods.clone(), p.games_repeats.saturating_add(2)),
    }
}

fn extreme(p: &ProviderProfile) -> Categories {
    Categories {
        base: Desync::new(p.desync_methods.clone(), p.repeats.saturating_add(1)),
        google: Desync::new(owned(EXTREME_GOOGLE_METHODS), p.google_repeats.saturating_add(3)),
        games: Desync::new(owned(EXTREME_GAMES_METHODS), p.games_repeats.saturating_add(3)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider;

    #[test]
    fn test_optimized_keeps_repeats() {
        let auto = provider::lookup("Auto");
        let eff = apply(auto, Mode::Optimized);
        assert_eq!(eff.base.repeats, auto.repeats);
        assert_eq!(eff.base.methods, auto.general_methods);
        assert_eq!(eff.google.repeats, auto.google_repeats);
        assert_eq!(eff.games.methods, auto.games_methods);
        assert!(!eff.games_fooling);
    }

    #[test]
    fn test_standard_switches_general_list() {
        let auto = provider::lookup("Auto");
        let eff = apply(auto, Mode::Standard);
        assert_eq!(eff.base.methods, ["fake", "split2"]);
        assert_eq!(eff.base.repeats, 3);
        assert_eq!(eff.google.repeats, 4);
        assert_eq!(eff.games.repeats, 3);
        assert!(eff.games_fooling);
    }

    #[test]
    fn test_aggressive_appends_multisplit_once() {
        let auto = provider::lookup("Auto");
        let eff = apply(auto, Mode::Aggressive);
        assert_eq!(eff.google.methods, ["fake", "fakedsplit", "multisplit"]);
        assert_eq!(eff.base.repeats, 4);

        let again = apply(auto, Mode::Aggressive);
        assert_eq!(again.google.methods.iter().filter(|m| *m == "multisplit").count(), 1);
        assert!(!auto.google_methods.iter().any(|m| m == "multisplit"));
    }

    #[test]
    fn test_extreme_replaces_lists() {
        let beeline = provider::lookup("Beeline");
        let eff = apply(beeline, Mode::Extreme);
        assert_eq!(eff.google.methods, EXTREME_GOOGLE_METHODS);
        assert_eq!(eff.games.methods, EXTREME_GAMES_METHODS);
        assert_eq!(eff.google.repeats, beeline.google_repeats + 3);
        assert_eq!(eff.games.repeats, beeline.games_repeats + 3);
        assert_eq!(eff.base.repeats, beeline.repeats + 1);
    }

    #[test]
    fn test_empty_lists_are_guarded() {
        let mut profile = provider::lookup("MTS").clone();
        profile.general_methods.clear();
        profile.google_methods.clear();
        profile.repeats = 0;

        let eff = apply(&profile, Mode::Optimized);
        assert_eq!(eff.base.methods, ["fake"]);
        assert_eq!(eff.google.methods, ["fake"]);
        assert_eq!(eff.base.repeats, 1);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("standard".parse::<Mode>().unwrap(), Mode::Standard);
        assert_eq!("Экстрим".parse::<Mode>().unwrap(), Mode::Extreme);
        assert_eq!("3".parse::<Mode>().unwrap(), Mode::Aggressive);
        assert!("turbo".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_order() {
        assert!(Mode::Optimized < Mode::Standard);
        assert!(Mode::Aggressive < Mode::Extreme);
        assert_eq!(Mode::default(), Mode::Optimized);
    }
}

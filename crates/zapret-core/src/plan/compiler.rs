//! Rule compiler
//!
//! Turns an [`EffectiveProfile`] into the ordered block list. Order matters:
//! the executable picks the first matching filter per flow, so the specific
//! categories come before the general catch-alls.

use crate::mode::{Desync, EffectiveProfile};
use crate::plan::block::{Category, HostSource, PortFilter, PortRange, RuleBlock};
use crate::resources::{lists, FileProbe, ResourceLayout, QUIC_FINGERPRINT, TLS_FINGERPRINT};

/// HTTPS / QUIC
pub const HTTPS: PortRange = PortRange::single(443);

/// Plain HTTP
pub const HTTP: PortRange = PortRange::single(80);

/// Discord voice and STUN ranges
pub const VOICE_PORTS: [PortRange; 2] = [PortRange::range(19294, 19344), PortRange::range(50000, 50100)];

/// Alternate HTTPS ports used by discord.media
pub const ALT_HTTPS_PORTS: [PortRange; 5] = [
    PortRange::single(2053),
    PortRange::single(2083),
    PortRange::single(2087),
    PortRange::single(2096),
    PortRange::single(8443),
];

const DISCORD_MEDIA: &str = "discord.media";
const FOOLING_TS: &str = "--dpi-desync-fooling=ts";
const FAKEDSPLIT_PATTERN: &str = "--dpi-desync-fakedsplit-pattern=0x00";

/// Fixed method per special-case hostlist
const SPECIAL_TARGETS: [(Category, &str, &[&str]); 4] = [
    (Category::Meta, lists::META, &["fake"]),
    (Category::Telegram, lists::TELEGRAM, &["fake", "fakedsplit"]),
    (Category::TikTok, lists::TIKTOK, &["split2"]),
    (Category::X, lists::X, &["fake"]),
];

fn methods(names: &[&str]) -> Vec<String> {
    names.iter().map(|m| (*m).to_string()).collect()
}

/// Compiles rule blocks against a resource layout
pub struct RuleCompiler<'a> {
    layout: &'a ResourceLayout,
    probe: &'a dyn FileProbe,
}

impl<'a> RuleCompiler<'a> {
    /// Create a compiler over `layout`, consulting `probe` for optional files
    pub fn new(layout: &'a ResourceLayout, probe: &'a dyn FileProbe) -> Self {
        Self { layout, probe }
    }

    fn fake_tls(&self) -> String {
        format!("--dpi-desync-fake-tls={}", self.layout.bin(TLS_FINGERPRINT).display())
    }

    fn fake_quic(&self) -> String {
        format!("--dpi-desync-fake-quic={}", self.layout.bin(QUIC_FINGERPRINT).display())
    }

    fn hostlist(&self, name: &str) -> HostSource {
        HostSource::Hostlist(self.layout.list(name))
    }

    fn ipset(&self, name: &str) -> HostSource {
        HostSource::Ipset(self.layout.list(name))
    }

    fn with_exclusions(&self, block: RuleBlock) -> RuleBlock {
        block.excluding(self.layout.list(lists::EXCLUDE), self.layout.list(lists::IPSET_EXCLUDE))
    }

    /// Build the full block sequence
    pub fn compile(&self, profile: &EffectiveProfile) -> Vec<RuleBlock> {
        let base = profile.base.repeats;

        let mut blocks = vec![
            self.quic(base),
            self.voice(base),
            self.discord_media(profile),
            self.google(profile),
            self.games(profile),
        ];
        blocks.extend(self.special_targets(base));
        blocks.extend(self.user_lists(base));
        blocks.extend(self.catch_all(profile));

        tracing::debug!(
            provider = %profile.provider,
            mode = %profile.mode,
            blocks = blocks.len(),
            "Compiled rule blocks"
        );
        blocks
    }

    fn quic(&self, base: u32) -> RuleBlock {
        let block = RuleBlock::new(
            Category::Quic,
            PortFilter::udp(&[HTTPS]),
            Desync::new(methods(&["fake"]), base),
        )
        .source(self.hostlist(lists::GENERAL));

        self.with_exclusions(block).flag(self.fake_quic())
    }

    fn voice(&self, base: u32) -> RuleBlock {
        RuleBlock::new(
            Category::Voice,
            PortFilter::udp(&VOICE_PORTS),
            Desync::new(methods(&["fake"]), base),
        )
        .l7(&["discord", "stun"])
    }

    fn discord_media(&self, profile: &EffectiveProfile) -> RuleBlock {
        RuleBlock::new(
            Category::DiscordMedia,
            PortFilter::tcp(&ALT_HTTPS_PORTS),
            Desync::new(methods(&["fake", "fakedsplit"]), profile.base.repeats.saturating_add(1)),
        )
        .source(HostSource::Domains(vec![DISCORD_MEDIA.to_string()]))
        .flag_if(profile.use_fooling, FOOLING_TS)
        .flag(FAKEDSPLIT_PATTERN)
        .flag(self.fake_tls())
    }

    fn google(&self, profile: &EffectiveProfile) -> RuleBlock {
        RuleBlock::new(Category::Google, PortFilter::tcp(&[HTTPS]), profile.google.clone())
            .source(self.hostlist(lists::GOOGLE))
            .ip_id_zero(profile.use_ip_id)
            .flag_if(profile.use_fooling, FOOLING_TS)
            .flag(FAKEDSPLIT_PATTERN)
            .flag(self.fake_tls())
    }

    fn games(&self, profile: &EffectiveProfile) -> RuleBlock {
        RuleBlock::new(Category::Games, PortFilter::tcp(&[HTTPS]), profile.games.clone())
            .source(self.hostlist(lists::GAMES))
            .flag_if(profile.games_fooling, FOOLING_TS)
    }

    fn special_targets(&self, base: u32) -> impl Iterator<Item = RuleBlock> + '_ {
        SPECIAL_TARGETS.iter().map(move |(category, list, names)| {
            RuleBlock::new(
                *category,
                PortFilter::tcp(&[HTTPS]),
                Desync::new(methods(names), base.max(1)),
            )
            .source(self.hostlist(list))
            .flag(self.fake_tls())
        })
    }

    /// User lists contribute a block only when present and non-empty
    fn user_lists(&self, base: u32) -> Vec<RuleBlock> {
        let mut blocks = Vec::new();

        if self.probe.is_non_empty(&self.layout.list(lists::USER_HOSTS)) {
            blocks.push(
                RuleBlock::new(
                    Category::UserHosts,
                    PortFilter::tcp(&[HTTPS]),
                    Desync::new(methods(&["fake"]), base),
                )
                .source(self.hostlist(lists::USER_HOSTS)),
            );
        } else {
            tracing::debug!(list = lists::USER_HOSTS, "User hostlist absent or empty, skipped");
        }

        if self.probe.is_non_empty(&self.layout.list(lists::USER_IPS)) {
            blocks.push(
                RuleBlock::new(
                    Category::UserIps,
                    PortFilter::tcp(&[HTTP, HTTPS]),
                    Desync::new(methods(&["fake"]), base),
                )
                .source(self.hostlist(lists::USER_IPS)),
            );
        } else {
            tracing::debug!(list = lists::USER_IPS, "User IP list absent or empty, skipped");
        }

        blocks
    }

    fn catch_all(&self, profile: &EffectiveProfile) -> [RuleBlock; 3] {
        let primary = || Desync::new(vec![profile.base.primary().to_string()], 1);

        [
            self.with_exclusions(
                RuleBlock::new(Category::GeneralHosts, PortFilter::tcp(&[HTTP, HTTPS]), primary())
                    .source(self.hostlist(lists::GENERAL)),
            ),
            self.with_exclusions(
                RuleBlock::new(Category::GeneralIps, PortFilter::tcp(&[HTTP, HTTPS]), primary())
                    .source(self.ipset(lists::IPSET_ALL)),
            ),
            self.with_exclusions(
                RuleBlock::new(
                    Category::GeneralQuic,
                    PortFilter::udp(&[HTTPS]),
                    Desync::new(methods(&["fake"]), profile.base.repeats),
                )
                .source(self.ipset(lists::IPSET_ALL)),
            )
            .flag(self.fake_quic()),
        ]
    }
}

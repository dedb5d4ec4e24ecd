//! Command plan assembler
//!
//! Flattens rule blocks into the argument vector: intercept filters first,
//! then each block's tokens separated by [`BLOCK_SEPARATOR`].

use std::collections::BTreeSet;

use crate::plan::block::{join_ports, PortRange, Protocol, RuleBlock};

/// Token starting the next filter block
pub const BLOCK_SEPARATOR: &str = "--new";

/// `--wf-tcp` / `--wf-udp` covering every port the blocks filter on
///
/// Ports are sorted and de-duplicated so the encoding does not depend on
/// block order.
pub fn intercept_filters(blocks: &[RuleBlock]) -> Vec<String> {
    [Protocol::Tcp, Protocol::Udp]
        .into_iter()
        .filter_map(|protocol| {
            let ports: BTreeSet<PortRange> = blocks
                .iter()
                .filter(|b| b.filter.protocol == protocol)
                .flat_map(|b| b.filter.ports.iter().copied())
                .collect();
            if ports.is_empty() {
                return None;
            }
            let ports: Vec<PortRange> = ports.into_iter().collect();
            Some(format!("--wf-{}={}", protocol.as_str(), join_ports(&ports)))
        })
        .collect()
}

/// Build the argument vector (executable excluded)
///
/// Disabled optional flags arrive as empty strings and are dropped here.
pub fn assemble(blocks: &[RuleBlock]) -> Vec<String> {
    let mut args = intercept_filters(blocks);

    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            args.push(BLOCK_SEPARATOR.to_string());
        }
        args.extend(block.tokens().into_iter().filter(|token| !token.is_empty()));
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Desync;
    use crate::plan::block::{Category, PortFilter};

    fn block(filter: PortFilter) -> RuleBlock {
        RuleBlock::new(Category::Google, filter, Desync::new(vec!["fake".into()], 1))
    }

    #[test]
    fn test_separators_between_blocks_only() {
        let blocks = vec![
            block(PortFilter::tcp(&[PortRange::single(443)])).flag(""),
            block(PortFilter::udp(&[PortRange::single(443)])),
        ];
        let args = assemble(&blocks);

        assert_eq!(
            args,
            [
                "--wf-tcp=443",
                "--wf-udp=443",
                "--filter-tcp=443",
                "--dpi-desync=fake",
                "--dpi-desync-repeats=1",
                "--new",
                "--filter-udp=443",
                "--dpi-desync=fake",
                "--dpi-desync-repeats=1",
            ]
        );
    }

    #[test]
    fn test_empty_block_list() {
        assert!(assemble(&[]).is_empty());
    }

    #[test]
    fn test_intercept_filters_sorted() {
        let blocks = vec![
            block(PortFilter::tcp(&[PortRange::single(8443), PortRange::single(443)])),
            block(PortFilter::tcp(&[PortRange::single(80), PortRange::single(443)])),
        ];
        assert_eq!(intercept_filters(&blocks), ["--wf-tcp=80,443,8443"]);
    }
}

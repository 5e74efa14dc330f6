//! Chains shipped with govhub, served through the cosmos.directory proxies.

use govhub_types::{ChainDescriptor, ChainId};

const DIRECTORY_REST: &str = "https://rest.cosmos.directory";
const DIRECTORY_RPC: &str = "https://rpc.cosmos.directory";

/// (chain id, directory slug, fee denom, display name)
const BUILTIN: [(&str, &str, &str, &str); 5] = [
    ("cosmoshub-4", "cosmoshub", "uatom", "Cosmos Hub"),
    ("osmosis-1", "osmosis", "uosmo", "Osmosis"),
    ("celestia", "celestia", "utia", "Celestia"),
    ("dymension_1100-1", "dymension", "udym", "Dymension"),
    ("neutron-1", "neutron", "untrn", "Neutron"),
];

pub fn builtin_chains() -> Vec<ChainDescriptor> {
    BUILTIN
        .iter()
        .map(|(chain_id, slug, denom, display_name)| ChainDescriptor {
            chain_id: ChainId::from(*chain_id),
            chain_name: chain_name(slug).to_string(),
            rest_endpoint: format!("{DIRECTORY_REST}/{slug}"),
            rpc_endpoint: format!("{DIRECTORY_RPC}/{slug}"),
            denom: denom.to_string(),
            display_name: display_name.to_string(),
        })
        .collect()
}

// The hub's directory slug differs from its registry name.
fn chain_name(slug: &str) -> &str {
    match slug {
        "cosmoshub" => "cosmos",
        other => other,
    }
}

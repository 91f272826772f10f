use crate::api::RepositoryRef;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Owner name fragments of chains which are not EVM compatible.
const NON_EVM_OWNERS: [&str; 13] = [
    "bitcoin",
    "solana",
    "cardano",
    "polkadot",
    "near",
    "cosmos",
    "algorand",
    "ripple",
    "stellar",
    "tezos",
    "filecoin",
    "chainalysis",
    "hyperledger",
];

/// (owner, repository, project name). Some repositories are listed more than once.
const CATALOG: &[(&str, &str, &str)] = &[
    ("ethereum", "go-ethereum", "Ethereum (Geth)"),
    ("ethereumjs", "ethereumjs-monorepo", "EthereumJS"),
    ("ethereum", "py-evm", "Python EVM"),
    ("ethereum-optimism", "optimism", "Optimism"),
    ("Microsoft", "eEVM", "Microsoft eEVM"),
    ("horizontalsystems", "ethereum-kit-android", "Ethereum Kit Android"),
    ("bitcoin", "bitcoin", "Bitcoin Core"),
    ("solana-labs", "solana", "Solana"),
    ("cardano-foundation", "cardano-node", "Cardano"),
    ("polkadot-fellows", "polkadot-sdk", "Polkadot"),
    ("chainlink", "chainlink", "Chainlink"),
    ("uniswap", "uniswap-v3-core", "Uniswap V3"),
    ("aave", "aave-v3-core", "Aave V3"),
    ("compound-finance", "compound-protocol", "Compound"),
    ("makerdao", "dss", "MakerDAO"),
    ("curvefi", "curve-contracts", "Curve Finance"),
    ("sushiswap", "sushiswap", "SushiSwap"),
    ("yearn", "yearn-vaults", "Yearn Finance"),
    ("0xProject", "0x-monorepo", "0x Protocol"),
    ("arbitrum", "nitro", "Arbitrum Nitro"),
    ("maticnetwork", "polygon-sdk", "Polygon SDK"),
    ("avalanche-foundation", "avalanchego", "Avalanche Go"),
    ("bnb-chain", "bsc", "BNB Smart Chain"),
    ("near", "nearcore", "NEAR Protocol"),
    ("cosmos", "cosmos-sdk", "Cosmos SDK"),
    ("algorand", "go-algorand", "Algorand"),
    ("ripple", "rippled", "Ripple"),
    ("stellar", "stellar-core", "Stellar"),
    ("tezos", "tezos", "Tezos"),
    ("filecoin-project", "lotus", "Filecoin"),
    ("graphprotocol", "graph-node", "The Graph"),
    ("chainalysis", "chainalysis-api", "Chainalysis"),
    ("consensys", "goquorum", "ConsenSys Quorum"),
    ("hyperledger", "fabric", "Hyperledger Fabric"),
    ("hyperledger", "indy", "Hyperledger Indy"),
    ("hyperledger", "iroha", "Hyperledger Iroha"),
    ("hyperledger", "sawtooth", "Hyperledger Sawtooth"),
    ("paritytech", "substrate", "Substrate"),
    ("web3j", "web3j", "Web3j"),
    ("trufflesuite", "truffle", "Truffle"),
    ("OpenZeppelin", "openzeppelin-contracts", "OpenZeppelin Contracts"),
    ("hardhat", "hardhat", "Hardhat"),
    ("foundry-rs", "foundry", "Foundry"),
    ("remix-project", "remix-ide", "Remix IDE"),
    ("metamask", "metamask-extension", "MetaMask"),
    ("walletconnect", "walletconnect-monorepo", "WalletConnect"),
    ("ethereum", "EIPs", "Ethereum Improvement Proposals"),
    ("ethereum", "eth2.0-specs", "Ethereum 2.0 Specs"),
    ("ethereum", "solidity", "Solidity"),
    ("vyperlang", "vyper", "Vyper"),
    ("nomiclabs", "hardhat-waffle", "Hardhat Waffle"),
    ("ethers-io", "ethers.js", "Ethers.js"),
    ("web3", "web3.js", "Web3.js"),
    ("brownie-mix", "brownie", "Brownie"),
    ("a16z", "erc721a", "ERC721A"),
    ("ProjectOpenSea", "opensea-js", "OpenSea JS"),
    ("uniswap", "v2-core", "Uniswap V2"),
    ("uniswap", "v2-periphery", "Uniswap V2 Periphery"),
    ("uniswap", "v3-periphery", "Uniswap V3 Periphery"),
    ("uniswap", "universal-router", "Uniswap Universal Router"),
    ("aave", "aave-protocol", "Aave Protocol"),
    ("aave", "aave-v2-core", "Aave V2 Core"),
    ("compound-finance", "compound-protocol", "Compound Protocol"),
    ("compound-finance", "compound-money-market", "Compound Money Market"),
    ("makerdao", "dss", "MakerDAO DSS"),
    ("makerdao", "multicall", "MakerDAO Multicall"),
    ("curvefi", "curve-contracts", "Curve Contracts"),
    ("curvefi", "curve-dao-contracts", "Curve DAO Contracts"),
    ("sushiswap", "sushiswap", "SushiSwap"),
    ("sushiswap", "sushiswap-interface", "SushiSwap Interface"),
    ("yearn", "yearn-vaults", "Yearn Vaults"),
    ("yearn", "yearn-strategy", "Yearn Strategy"),
    ("0xProject", "0x-monorepo", "0x Protocol"),
    ("0xProject", "0x-protocol", "0x Protocol"),
    ("arbitrum", "nitro", "Arbitrum Nitro"),
    ("arbitrum", "arbitrum", "Arbitrum One"),
    ("maticnetwork", "polygon-sdk", "Polygon SDK"),
    ("maticnetwork", "bor", "Polygon Bor"),
    ("maticnetwork", "heimdall", "Polygon Heimdall"),
    ("avalanche-foundation", "avalanchego", "Avalanche Go"),
    ("avalanche-foundation", "subnet-evm", "Avalanche Subnet EVM"),
    ("bnb-chain", "bsc", "BNB Smart Chain"),
    ("bnb-chain", "bsc-genesis-contract", "BNB Smart Chain Genesis"),
    ("near", "nearcore", "NEAR Core"),
    ("near", "near-sdk-rs", "NEAR SDK Rust"),
    ("cosmos", "cosmos-sdk", "Cosmos SDK"),
    ("cosmos", "gaia", "Cosmos Gaia"),
    ("algorand", "go-algorand", "Algorand Go"),
    ("algorand", "py-algorand-sdk", "Algorand Python SDK"),
    ("ripple", "rippled", "Ripple"),
    ("ripple", "rippled-historical-database", "Ripple Historical"),
    ("stellar", "stellar-core", "Stellar Core"),
    ("stellar", "stellar-sdk", "Stellar SDK"),
    ("tezos", "tezos", "Tezos"),
    ("tezos", "tezos-sdk", "Tezos SDK"),
    ("filecoin-project", "lotus", "Filecoin Lotus"),
    ("filecoin-project", "go-filecoin", "Filecoin Go"),
    ("graphprotocol", "graph-node", "The Graph Node"),
    ("graphprotocol", "graph-client", "The Graph Client"),
    ("chainalysis", "chainalysis-api", "Chainalysis API"),
    ("consensys", "goquorum", "ConsenSys Quorum"),
    ("consensys", "teku", "ConsenSys Teku"),
    ("hyperledger", "fabric", "Hyperledger Fabric"),
    ("hyperledger", "indy", "Hyperledger Indy"),
    ("hyperledger", "iroha", "Hyperledger Iroha"),
    ("hyperledger", "sawtooth", "Hyperledger Sawtooth"),
    ("paritytech", "substrate", "Substrate"),
    ("paritytech", "polkadot", "Polkadot"),
    ("web3j", "web3j", "Web3j"),
    ("web3j", "web3j-gradle-plugin", "Web3j Gradle Plugin"),
    ("trufflesuite", "truffle", "Truffle"),
    ("trufflesuite", "ganache", "Ganache"),
    ("OpenZeppelin", "openzeppelin-contracts", "OpenZeppelin Contracts"),
    ("OpenZeppelin", "openzeppelin-sdk", "OpenZeppelin SDK"),
    ("hardhat", "hardhat", "Hardhat"),
    ("hardhat", "hardhat-deploy", "Hardhat Deploy"),
    ("foundry-rs", "foundry", "Foundry"),
    ("foundry-rs", "foundry-up", "Foundry Up"),
    ("remix-project", "remix-ide", "Remix IDE"),
    ("remix-project", "remix-desktop", "Remix Desktop"),
    ("metamask", "metamask-extension", "MetaMask Extension"),
    ("metamask", "metamask-mobile", "MetaMask Mobile"),
    ("walletconnect", "walletconnect-monorepo", "WalletConnect"),
    ("walletconnect", "walletconnect-web3-provider", "WalletConnect Provider"),
];

/// Every repository of the built-in catalog, in catalog order and including repeated entries.
pub fn catalog() -> Vec<RepositoryRef> {
    CATALOG
        .iter()
        .map(|(owner, name, project)| RepositoryRef::new(owner.to_string(), name.to_string(), project.to_string()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    /// Maximal number of repositories kept per owner.
    pub max_per_owner: Option<usize>,
    /// Drops owners of chains which are not EVM compatible.
    pub evm_only: bool,
}

impl RepositoryFilter {
    /// Keeps order of `repos`. Repeated `owner/name` pairs are kept once and do not count towards the owner cap.
    pub fn apply<I>(&self, repos: I) -> Vec<RepositoryRef>
    where
        I: IntoIterator<Item = RepositoryRef>,
    {
        let mut seen = HashSet::new();
        let mut per_owner: HashMap<String, usize> = HashMap::new();
        let mut kept = Vec::new();
        for repo in repos {
            if self.evm_only && !is_evm(&repo.owner) {
                debug!("Skipping non EVM repository {}", repo);
                continue;
            }
            if seen.contains(&(repo.owner.clone(), repo.name.clone())) {
                debug!("Skipping repeated repository {}", repo);
                continue;
            }
            let count = per_owner.entry(repo.owner.clone()).or_default();
            if matches!(self.max_per_owner, Some(max) if *count >= max) {
                debug!("Skipping {}, owner limit reached", repo);
                continue;
            }
            *count += 1;
            seen.insert((repo.owner.clone(), repo.name.clone()));
            kept.push(repo);
        }
        kept
    }
}

fn is_evm(owner: &str) -> bool {
    let owner = owner.to_lowercase();
    !NON_EVM_OWNERS.iter().any(|fragment| owner.contains(fragment))
}

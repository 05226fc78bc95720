//! Filesystem artifact store.
//!
//! Reads compiler output from one or more artifact roots. Both Hardhat and
//! Foundry place each contract at `<root>/.../<Source>.sol/<Name>.json`:
//!
//! - Hardhat: `artifacts/contracts/Delance.sol/Delance.json`, with `bytecode`
//!   as a hex string.
//! - Foundry: `out/Delance.sol/Delance.json`, with `bytecode.object`.
//!
//! Roots are searched in order and the first root containing a match wins.

use crate::{ArtifactError, ArtifactStore, ContractName};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use async_trait::async_trait;
use deployer_types::{without_0x_prefix, ContractFactory};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories that hold compiler metadata rather than contract artifacts.
const SKIPPED_DIRS: &[&str] = &["build-info", "cache"];

/// Artifact store backed by compiler output directories.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
	roots: Vec<PathBuf>,
}

impl FileArtifactStore {
	pub fn new(roots: Vec<PathBuf>) -> Self {
		Self { roots }
	}

	pub fn roots(&self) -> &[PathBuf] {
		&self.roots
	}

	/// Finds every artifact file in `root` that matches `name`.
	async fn find_candidates(
		&self,
		root: &Path,
		name: &ContractName,
	) -> Result<Vec<PathBuf>, ArtifactError> {
		let file_name = format!("{}.json", name.contract);
		let found = collect_artifact_files(root).await?;

		let candidates = found
			.into_iter()
			.filter(|path| path.file_name().and_then(|f| f.to_str()) == Some(file_name.as_str()))
			.filter(|path| match &name.source {
				Some(source) => source_dir(root, path)
					.map(|dir| source.ends_with(&dir) || dir.ends_with(source))
					.unwrap_or(false),
				None => true,
			})
			.collect();

		Ok(candidates)
	}

	/// Loads and validates one artifact file.
	async fn load(&self, path: &Path, contract: &str) -> Result<ContractFactory, ArtifactError> {
		let invalid = |reason: String| ArtifactError::Invalid {
			path: path.to_path_buf(),
			reason,
		};

		let content = tokio::fs::read_to_string(path).await?;
		let json: Value =
			serde_json::from_str(&content).map_err(|e| invalid(format!("invalid JSON: {}", e)))?;

		let abi_value = json
			.get("abi")
			.cloned()
			.ok_or_else(|| invalid("missing abi".to_string()))?;
		let abi: JsonAbi =
			serde_json::from_value(abi_value).map_err(|e| invalid(format!("invalid abi: {}", e)))?;

		let bytecode_hex = extract_bytecode(&json).ok_or_else(|| invalid("missing bytecode".to_string()))?;
		let bytecode_hex = without_0x_prefix(bytecode_hex.trim());

		if bytecode_hex.is_empty() {
			return Err(ArtifactError::NoBytecode(contract.to_string()));
		}

		// Solidity link placeholders: `__$<hash>$__` or legacy `__Lib______`
		if bytecode_hex.contains("__") {
			return Err(ArtifactError::UnlinkedLibraries(contract.to_string()));
		}

		let bytecode = hex::decode(bytecode_hex)
			.map(Bytes::from)
			.map_err(|e| invalid(format!("invalid bytecode hex: {}", e)))?;

		debug!(
			contract = contract,
			path = %path.display(),
			bytecode_len = bytecode.len(),
			"Loaded contract artifact"
		);

		Ok(ContractFactory::new(contract, path, abi, bytecode))
	}
}

/// Extracts the creation bytecode in either Hardhat or Foundry form.
fn extract_bytecode(json: &Value) -> Option<&str> {
	match json.get("bytecode")? {
		Value::String(code) => Some(code.as_str()),
		Value::Object(obj) => obj.get("object").and_then(|o| o.as_str()),
		_ => None,
	}
}

/// Relative `<...>/<Source>.sol` directory of an artifact under `root`.
fn source_dir(root: &Path, artifact: &Path) -> Option<PathBuf> {
	artifact
		.parent()?
		.strip_prefix(root)
		.ok()
		.map(Path::to_path_buf)
}

/// Collects `<Source>.sol/<Name>.json` files below `root`, skipping debug files.
async fn collect_artifact_files(root: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
	let mut found = Vec::new();
	let mut pending = vec![root.to_path_buf()];

	while let Some(dir) = pending.pop() {
		let in_source_dir = dir
			.file_name()
			.and_then(|d| d.to_str())
			.is_some_and(|d| d.ends_with(".sol"));

		let mut entries = tokio::fs::read_dir(&dir).await?;
		while let Some(entry) = entries.next_entry().await? {
			let path = entry.path();
			let file_name = entry.file_name();
			let Some(file_name) = file_name.to_str() else {
				continue;
			};

			if entry.file_type().await?.is_dir() {
				if !SKIPPED_DIRS.contains(&file_name) {
					pending.push(path);
				}
				continue;
			}

			if in_source_dir && file_name.ends_with(".json") && !file_name.ends_with(".dbg.json") {
				found.push(path);
			}
		}
	}

	Ok(found)
}

/// Whether `root` exists and is a directory.
async fn is_dir(root: &Path) -> bool {
	tokio::fs::metadata(root)
		.await
		.is_ok_and(|meta| meta.is_dir())
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
	async fn resolve_contract_artifact(
		&self,
		name: &str,
	) -> Result<ContractFactory, ArtifactError> {
		let parsed = ContractName::parse(name)?;

		for root in &self.roots {
			if !is_dir(root).await {
				debug!(root = %root.display(), "Skipping missing artifacts directory");
				continue;
			}

			let mut candidates = self.find_candidates(root, &parsed).await?;
			match candidates.len() {
				0 => continue,
				1 => {
					let path = candidates.remove(0);
					return self.load(&path, &parsed.contract).await;
				},
				_ => {
					candidates.sort();
					return Err(ArtifactError::Ambiguous {
						name: name.to_string(),
						candidates: candidates
							.iter()
							.filter_map(|path| source_dir(root, path))
							.map(|dir| format!("{}:{}", dir.display(), parsed.contract))
							.collect(),
					});
				},
			}
		}

		Err(ArtifactError::NotFound {
			name: name.to_string(),
			searched: self.roots.clone(),
		})
	}

	async fn list_contracts(&self) -> Result<Vec<String>, ArtifactError> {
		let mut contracts = Vec::new();

		for root in &self.roots {
			if !is_dir(root).await {
				continue;
			}

			for path in collect_artifact_files(root).await? {
				let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
					continue;
				};
				let content = tokio::fs::read_to_string(&path).await?;
				let deployable = serde_json::from_str::<Value>(&content)
					.ok()
					.as_ref()
					.and_then(extract_bytecode)
					.is_some_and(|code| !without_0x_prefix(code).is_empty());

				if deployable && !contracts.iter().any(|c| c == name) {
					contracts.push(name.to_string());
				}
			}
		}

		contracts.sort();
		Ok(contracts)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	const ABI_NO_CONSTRUCTOR: &str = r#"[{"type":"function","name":"owner","inputs":[],"outputs":[{"name":"","type":"address","internalType":"address"}],"stateMutability":"view"}]"#;

	fn write(path: &Path, content: &str) {
		std::fs::create_dir_all(path.parent().unwrap()).unwrap();
		std::fs::write(path, content).unwrap();
	}

	fn hardhat_artifact(name: &str, bytecode: &str) -> String {
		format!(
			r#"{{"_format":"hh-sol-artifact-1","contractName":"{name}","sourceName":"contracts/{name}.sol","abi":{ABI_NO_CONSTRUCTOR},"bytecode":"{bytecode}","deployedBytecode":"0x"}}"#
		)
	}

	fn foundry_artifact(bytecode: &str) -> String {
		format!(
			r#"{{"abi":{ABI_NO_CONSTRUCTOR},"bytecode":{{"object":"{bytecode}","sourceMap":"","linkReferences":{{}}}}}}"#
		)
	}

	fn hardhat_store(dir: &TempDir) -> FileArtifactStore {
		FileArtifactStore::new(vec![dir.path().join("artifacts")])
	}

	#[tokio::test]
	async fn test_resolve_hardhat_artifact() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x6080604052"),
		);
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.dbg.json"),
			r#"{"_format":"hh-sol-dbg-1","buildInfo":"../../build-info/abc.json"}"#,
		);

		let factory = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap();

		assert_eq!(factory.name(), "Delance");
		assert_eq!(factory.bytecode(), &Bytes::from(vec![0x60, 0x80, 0x60, 0x40, 0x52]));
		assert!(factory.source().ends_with("Delance.sol/Delance.json"));
		assert_eq!(factory.abi().functions().count(), 1);
	}

	#[tokio::test]
	async fn test_resolve_foundry_artifact() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("out/Delance.sol/Delance.json"),
			&foundry_artifact("0x60806040"),
		);

		let store = FileArtifactStore::new(vec![dir.path().join("artifacts"), dir.path().join("out")]);
		let factory = store.resolve_contract_artifact("Delance").await.unwrap();

		assert_eq!(factory.bytecode().len(), 4);
	}

	#[tokio::test]
	async fn test_first_root_with_match_wins() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x01"),
		);
		write(
			&dir.path().join("out/Delance.sol/Delance.json"),
			&foundry_artifact("0x0202"),
		);

		let store = FileArtifactStore::new(vec![dir.path().join("artifacts"), dir.path().join("out")]);
		let factory = store.resolve_contract_artifact("Delance").await.unwrap();

		assert_eq!(factory.bytecode(), &Bytes::from(vec![0x01]));
	}

	#[tokio::test]
	async fn test_missing_artifact_is_not_found() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Other.sol/Other.json"),
			&hardhat_artifact("Other", "0x01"),
		);

		let err = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap_err();

		match err {
			ArtifactError::NotFound { name, searched } => {
				assert_eq!(name, "Delance");
				assert_eq!(searched, vec![dir.path().join("artifacts")]);
			},
			other => panic!("expected NotFound, got {other}"),
		}
	}

	#[tokio::test]
	async fn test_missing_roots_are_not_found() {
		let dir = TempDir::new().unwrap();
		let err = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap_err();

		assert!(matches!(err, ArtifactError::NotFound { .. }));
	}

	#[tokio::test]
	async fn test_interface_has_no_bytecode() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/IDelance.sol/IDelance.json"),
			&hardhat_artifact("IDelance", "0x"),
		);

		let err = hardhat_store(&dir)
			.resolve_contract_artifact("IDelance")
			.await
			.unwrap_err();

		assert!(matches!(err, ArtifactError::NoBytecode(name) if name == "IDelance"));
	}

	#[tokio::test]
	async fn test_unlinked_library_rejected() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x6080__$a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5$__6040"),
		);

		let err = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap_err();

		assert!(matches!(err, ArtifactError::UnlinkedLibraries(_)));
	}

	#[tokio::test]
	async fn test_corrupt_artifact_is_invalid() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			"{ not json",
		);

		let err = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap_err();

		assert!(matches!(err, ArtifactError::Invalid { .. }));
	}

	#[tokio::test]
	async fn test_ambiguous_name_and_fully_qualified_resolution() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x01"),
		);
		write(
			&dir.path().join("artifacts/contracts/legacy/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x02"),
		);
		let store = hardhat_store(&dir);

		let err = store.resolve_contract_artifact("Delance").await.unwrap_err();
		match err {
			ArtifactError::Ambiguous { candidates, .. } => {
				assert_eq!(
					candidates,
					vec![
						"contracts/Delance.sol:Delance".to_string(),
						"contracts/legacy/Delance.sol:Delance".to_string(),
					]
				);
			},
			other => panic!("expected Ambiguous, got {other}"),
		}

		let factory = store
			.resolve_contract_artifact("contracts/legacy/Delance.sol:Delance")
			.await
			.unwrap();
		assert_eq!(factory.bytecode(), &Bytes::from(vec![0x02]));
	}

	#[tokio::test]
	async fn test_build_info_directory_is_skipped() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/build-info/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x09"),
		);

		let err = hardhat_store(&dir)
			.resolve_contract_artifact("Delance")
			.await
			.unwrap_err();

		assert!(matches!(err, ArtifactError::NotFound { .. }));
	}

	#[tokio::test]
	async fn test_list_contracts_skips_interfaces() {
		let dir = TempDir::new().unwrap();
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/Delance.json"),
			&hardhat_artifact("Delance", "0x01"),
		);
		write(
			&dir.path().join("artifacts/contracts/Delance.sol/IDelance.json"),
			&hardhat_artifact("IDelance", "0x"),
		);
		write(
			&dir.path().join("artifacts/contracts/Escrow.sol/Escrow.json"),
			&hardhat_artifact("Escrow", "0x02"),
		);

		let contracts = hardhat_store(&dir).list_contracts().await.unwrap();
		assert_eq!(contracts, vec!["Delance".to_string(), "Escrow".to_string()]);
	}
}

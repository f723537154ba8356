use camino::{Utf8Path, Utf8PathBuf};
use datalint_domain::reference::SUPPORTED_HOST;
use std::fmt;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import {spec:?} from {importer} not found (searched: {})", display_roots(.searched))]
    NotFound {
        spec: String,
        importer: Utf8PathBuf,
        searched: Vec<Utf8PathBuf>,
    },
    #[error("read import {path}: {source}")]
    Read { path: Utf8PathBuf, source: io::Error },
}

fn display_roots(roots: &[Utf8PathBuf]) -> String {
    roots
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One tier of import resolution.
pub trait ImportStrategy: Send + Sync + fmt::Debug {
    /// Directories an import from `importer` is looked up in, in order.
    fn roots(&self, importer: &Utf8Path) -> Vec<Utf8PathBuf>;
}

/// Imports relative to the importing file's directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelativeImport;

impl ImportStrategy for RelativeImport {
    fn roots(&self, importer: &Utf8Path) -> Vec<Utf8PathBuf> {
        importer
            .parent()
            .map(|dir| vec![dir.to_path_buf()])
            .unwrap_or_default()
    }
}

/// Imports from the module cache, by slash path (`owner/repo/ref/path`) or with the host
/// prefixed (`github.com/owner/repo/ref/path`).
#[derive(Clone, Debug)]
pub struct ModuleCacheImport {
    base: Utf8PathBuf,
}

impl ModuleCacheImport {
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ImportStrategy for ModuleCacheImport {
    fn roots(&self, _importer: &Utf8Path) -> Vec<Utf8PathBuf> {
        vec![self.base.join(SUPPORTED_HOST), self.base.clone()]
    }
}

/// Ordered resolution tiers; the first hit wins.
#[derive(Debug, Default)]
pub struct ImportChain {
    strategies: Vec<Box<dyn ImportStrategy>>,
}

impl ImportChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative to the importer first, then the module cache under `module_base`.
    pub fn standard(module_base: &Utf8Path) -> Self {
        Self::new()
            .with(RelativeImport)
            .with(ModuleCacheImport::new(module_base))
    }

    pub fn with(mut self, strategy: impl ImportStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn search_roots(&self, importer: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut roots: Vec<Utf8PathBuf> = Vec::new();
        for root in self.strategies.iter().flat_map(|s| s.roots(importer)) {
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        roots
    }

    pub fn resolve(&self, importer: &Utf8Path, spec: &str) -> Result<Utf8PathBuf, ImportError> {
        let searched = self.search_roots(importer);
        searched
            .iter()
            .map(|root| root.join(spec))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ImportError::NotFound {
                spec: spec.to_string(),
                importer: importer.to_path_buf(),
                searched,
            })
    }
}

/// What an engine sees of import resolution while evaluating one rule.
#[derive(Clone, Copy, Debug)]
pub struct ImportContext<'a> {
    importer: &'a Utf8Path,
    chain: &'a ImportChain,
}

impl<'a> ImportContext<'a> {
    pub fn new(importer: &'a Utf8Path, chain: &'a ImportChain) -> Self {
        Self { importer, chain }
    }

    pub fn importer(&self) -> &Utf8Path {
        self.importer
    }

    /// For engines that only take library search paths.
    pub fn search_roots(&self) -> Vec<Utf8PathBuf> {
        self.chain.search_roots(self.importer)
    }

    pub fn resolve(&self, spec: &str) -> Result<Utf8PathBuf, ImportError> {
        self.chain.resolve(self.importer, spec)
    }

    /// Resolve and read an import.
    pub fn read(&self, spec: &str) -> Result<(Utf8PathBuf, String), ImportError> {
        let path = self.resolve(spec)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok((path, text)),
            Err(source) => Err(ImportError::Read { path, source }),
        }
    }
}

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A list of globs where entries prefixed with `!` exclude.
///
/// A path matches when it matches at least one positive pattern and no negative one. `*` never
/// crosses a `/`; use `**` to recurse.
#[derive(Clone, Debug)]
pub struct PatternSet {
    include: GlobSet,
    exclude: GlobSet,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> anyhow::Result<Self> {
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            match pattern.strip_prefix('!') {
                Some(negated) => exclude.add(compile(negated)?),
                None => include.add(compile(pattern)?),
            };
        }
        Ok(Self {
            include: include.build()?,
            exclude: exclude.build()?,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.is_excluded(path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.is_match(path)
    }
}

fn compile(pattern: &str) -> anyhow::Result<globset::Glob> {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    Ok(GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()?)
}

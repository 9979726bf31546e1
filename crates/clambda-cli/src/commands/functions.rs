//! `clambda functions`

use std::path::Path;

use anyhow::Context;
use clambda_host::Extension;

pub fn execute(library: &Path) -> anyhow::Result<()> {
    let extension = Extension::load(library)
        .with_context(|| format!("failed to load {}", library.display()))?;

    let functions = extension.functions();
    if functions.is_empty() {
        println!("{} publishes no function manifest", extension.path());
    }
    for name in functions {
        println!("{}", name);
    }
    Ok(())
}

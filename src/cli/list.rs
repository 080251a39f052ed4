//! List CLI command

use chrono::Utc;
use clap::Args;

use crate::backup::RetrievalManager;
use crate::config::settings::Settings;
use crate::display::format_artifact_list;
use crate::error::VaultResult;
use crate::models::ClassSelection;
use crate::store::Backend;

/// Arguments for `webvault list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Classes to list: db, site or all
    #[arg(default_value = "all")]
    pub target: ClassSelection,
}

/// Handle the list command, newest backups first
pub fn handle_list_command(
    settings: &Settings,
    backend: &dyn Backend,
    args: ListArgs,
) -> VaultResult<()> {
    let now = Utc::now();

    for class in args.target.classes() {
        let namespace = settings.namespace_for(class);
        let store = backend.open(&namespace)?;
        let artifacts = RetrievalManager::new(store.as_ref()).list(class)?;

        println!("{}", namespace);
        println!("{}", "=".repeat(namespace.len()));
        println!("{}", format_artifact_list(&artifacts, now).trim_end());
        println!("Total: {} backup(s)", artifacts.len());
        println!();
    }

    Ok(())
}

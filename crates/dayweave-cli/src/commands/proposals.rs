use clap::Subcommand;
use dayweave_core::{JsonFileRepository, ProposalRepository};

use super::CliResult;

#[derive(Subcommand)]
pub enum ProposalsAction {
    /// List stored proposals of a day
    List {
        /// Day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove one proposal
    Remove {
        /// Proposal id
        id: String,
    },
    /// Remove every proposal of a day
    Clear {
        /// Day (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: ProposalsAction) -> CliResult {
    let repo = JsonFileRepository::open_default()?;
    match action {
        ProposalsAction::List { date } => {
            let date = super::resolve_date(date.as_deref())?;
            let proposals = super::runtime()?.block_on(repo.list(date))?;
            super::print_json(&proposals)?;
        }
        ProposalsAction::Remove { id } => {
            super::runtime()?.block_on(repo.delete(&id))?;
            println!("removed {id}");
        }
        ProposalsAction::Clear { date } => {
            let date = super::resolve_date(date.as_deref())?;
            let removed = super::runtime()?.block_on(repo.clear_date(date))?;
            println!("removed {removed} proposal(s)");
        }
    }
    Ok(())
}

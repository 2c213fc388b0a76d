use clap::{Parser, Subcommand};
use omaggio::Language;

/// Omaggio - trilingual digital-tribute atelier.
#[derive(Parser, Debug)]
#[command(name = "omaggio")]
#[command(version = "0.1.0")]
#[command(about = "AI-composed tributes with voice, imagery and commission handoff.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an atelier session: consent, draft, then voice / image / commission
    Compose {
        /// Language for drafts and mail templates (it, en, de)
        #[arg(short, long)]
        language: Option<Language>,

        /// Compose a single prompt non-interactively and print the draft
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Build and open a commission email for a catalog category
    Mail {
        /// Catalog category (bday, anniv, holiday, memorial, bespoke)
        category: String,

        /// Ask for the recurring annual plan
        #[arg(long)]
        recurring: bool,

        /// Language for the mail templates (it, en, de)
        #[arg(short, long)]
        language: Option<Language>,

        /// Print the mailto URI instead of launching the mail client
        #[arg(long)]
        dry_run: bool,
    },
}

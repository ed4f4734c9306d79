use crate::providers::demo::DemoKind;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ragbridge")]
#[command(author, version, about = "User-context enrichment for RAG chatbots", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the composed context block for one query
    Context {
        query: String,

        #[arg(short = 'u', long, default_value = "anonymous")]
        user: String,

        #[arg(short = 's', long, default_value = "default")]
        session: String,

        /// Record the query as a turn with this response after printing
        #[arg(long)]
        record: Option<String>,

        /// Topic label for the recorded turn
        #[arg(long)]
        topic: Option<String>,
    },

    /// Show which intent gates and tags a query triggers
    Classify { query: String },

    /// Verify that every gate keyword list covers its fine tags
    CheckKeywords,

    /// Remove sessions idle for longer than the retention window
    Cleanup {
        #[arg(long)]
        max_age_days: Option<i64>,
    },

    /// Run a demo data provider on stdin/stdout
    ServeDemo {
        #[arg(short, long, value_enum)]
        kind: DemoKind,
    },
}

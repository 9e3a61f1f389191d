use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arogya_agents::{HealthAgent, LogSender};
use arogya_core::{
    classify_intent, extract_age, resolve_language, BroadcastRequest, CatalogContentProvider,
    ContentProvider, Intent, Language, MessageRequest, StaticContentProvider,
};
use arogya_observability::{init_tracing, AppMetrics};
use arogya_storage::Store;
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "arogya")]
#[command(about = "Arogya multilingual health messaging CLI")]
struct Cli {
    #[arg(long, env = "AROGYA_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "AROGYA_CONTENT_PATH")]
    content_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one message through the pipeline and print the result.
    Message {
        #[arg(long, default_value = "cli")]
        phone: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        pincode: Option<String>,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Show language, intent and age for a text without composing a reply.
    Detect {
        text: String,
        #[arg(long)]
        lang: Option<String>,
    },
    Chat {
        #[arg(long, default_value = "cli")]
        phone: String,
        #[arg(long)]
        pincode: Option<String>,
    },
    Subscribe {
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "en")]
        lang: String,
    },
    Broadcast {
        #[arg(long)]
        message_en: String,
        #[arg(long)]
        message_hi: Option<String>,
        #[arg(long)]
        message_te: Option<String>,
        #[arg(long)]
        message_kn: Option<String>,
        #[arg(long)]
        message_ta: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct Detection {
    lang: Language,
    intent: Intent,
    age: Option<u8>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("arogya_cli");
    let cli = Cli::parse();

    let agent = build_agent(cli.database_url.as_deref(), cli.content_path.as_ref()).await?;

    match cli.command {
        Command::Message {
            phone,
            text,
            pincode,
            lang,
        } => {
            let mut request = MessageRequest::new(phone, text);
            request.pincode = pincode;
            request.language_hint = lang;

            let result = agent.handle_message_and_deliver(request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Detect { text, lang } => {
            let lang = resolve_language(lang.as_deref(), &text);
            let detection = Detection {
                lang,
                intent: classify_intent(&text, lang),
                age: extract_age(&text),
            };
            println!("{}", serde_json::to_string_pretty(&detection)?);
        }
        Command::Chat { phone, pincode } => run_chat(agent, phone, pincode).await?,
        Command::Subscribe { phone, lang } => {
            let lang = lang.parse::<Language>().context("invalid --lang value")?;
            let subscriber = agent.subscribe(&phone, lang).await?;
            println!("{}", serde_json::to_string_pretty(&subscriber)?);
        }
        Command::Broadcast {
            message_en,
            message_hi,
            message_te,
            message_kn,
            message_ta,
        } => {
            let report = agent
                .broadcast(&BroadcastRequest {
                    message_en,
                    message_hi,
                    message_te,
                    message_kn,
                    message_ta,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: HealthAgent<Store>, phone: String, pincode: Option<String>) -> Result<()> {
    println!("Arogya chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let mut request = MessageRequest::new(phone.clone(), message);
        request.pincode = pincode.clone();

        let result = agent.handle_message_and_deliver(request).await;
        println!("\n[{} / {}]\n{}\n", result.lang, result.intent, result.reply);
    }

    Ok(())
}

async fn build_agent(
    database_url: Option<&str>,
    content_path: Option<&PathBuf>,
) -> Result<HealthAgent<Store>> {
    let metrics = AppMetrics::shared();

    let content: Arc<dyn ContentProvider> = match content_path {
        Some(path) => Arc::new(
            CatalogContentProvider::from_path(path)
                .with_context(|| format!("failed loading content catalog from {}", path.display()))?,
        ),
        None => Arc::new(StaticContentProvider::new()),
    };

    let store = Store::from_database_url(database_url).await?;

    Ok(HealthAgent::new(
        content,
        Arc::new(LogSender),
        Arc::new(store),
        metrics,
    ))
}

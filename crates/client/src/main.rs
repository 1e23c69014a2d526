//! Terminal front-end for the normrag query service.

use clap::Parser;
use normrag_client::{
    example_question, render_answer, render_error, ApiClient, ClientError, DEFAULT_API_URL,
    EXAMPLE_QUESTIONS,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "normrag-client")]
#[command(about = "Ask ISO/IEC 17025:2017 questions to the normrag query service")]
struct Args {
    /// Base URL of the query service
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Ask a single question and exit
    #[arg(short, long, conflicts_with = "example")]
    question: Option<String>,

    /// Ask built-in example question N (1-4) and exit
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
    example: Option<u8>,

    /// Print the built-in example questions and exit
    #[arg(long)]
    list_examples: bool,

    /// Seconds to wait for an answer
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.list_examples {
        print_examples();
        return Ok(());
    }

    let client = ApiClient::new(&args.api_url, Duration::from_secs(args.timeout_secs))?;

    let one_shot = args
        .question
        .clone()
        .or_else(|| args.example.and_then(|n| example_question(n as usize)).map(String::from));
    if let Some(question) = one_shot {
        return match ask_and_print(&client, &question).await {
            Ok(()) => Ok(()),
            Err(err) => Err(anyhow::anyhow!(render_error(&err, client.base_url()))),
        };
    }

    interactive(&client).await
}

fn print_examples() {
    println!("💡 Exemplos de Consultas");
    for (i, (label, question)) in EXAMPLE_QUESTIONS.iter().enumerate() {
        println!("  {}. {label}: {question}", i + 1);
    }
}

async fn ask_and_print(client: &ApiClient, question: &str) -> Result<(), ClientError> {
    eprintln!("🔄 Processando consulta RAG...");
    let response = client.ask(question).await?;
    println!("{}", render_answer(&response));
    Ok(())
}

async fn interactive(client: &ApiClient) -> anyhow::Result<()> {
    println!("📋 Assistente RAG para Consultoria em Qualidade Laboratorial");
    println!("Sistema de Recuperação Aumentada por Geração aplicado à norma ISO/IEC 17025:2017");
    println!("API: {}", client.base_url());
    println!();
    print_examples();
    println!();
    println!("Digite sua consulta (1-4 para um exemplo, 'sair' para encerrar).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if matches!(input, "sair" | "exit" | "quit") {
            break;
        }

        let question = input
            .parse::<usize>()
            .ok()
            .and_then(example_question)
            .unwrap_or(input);
        if question != input {
            println!("Consulta: {question}");
        }

        match ask_and_print(client, question).await {
            Ok(()) => {}
            Err(ClientError::EmptyQuestion) => println!("⚠️ {}", ClientError::EmptyQuestion),
            Err(err) => println!("❌ {}", render_error(&err, client.base_url())),
        }
    }
    Ok(())
}

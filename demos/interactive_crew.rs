use std::io::{self, Write};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Duration};

use agentcrew::artifact::FsArtifactSink;
use agentcrew::attachment::Attachment;
use agentcrew::chat::CrewChat;
use agentcrew::config::CrewConfig;
use agentcrew::presets::academic_crew;
use agentcrew::RateLimiter;

// Run from the root folder of the repo as follows:
// GROQ_API_KEY=your-groq-key-here cargo run --example interactive_crew
//
// or keep the key in ./secrets.toml as GROQ_API_KEY = "..."
//
// Type ":attach path/to/file.csv" to attach a JSON/CSV file to the next question.

#[tokio::main]
async fn main() {
    agentcrew::init_logger();

    let config = CrewConfig::from_secrets_file("secrets.toml")
        .or_else(|_| CrewConfig::from_env())
        .expect("Please set GROQ_API_KEY or create secrets.toml");

    let client = Arc::new(config.groq_client().expect("API key is configured"));
    let limiter = Arc::new(RateLimiter::with_default_ceilings());

    let pipeline = academic_crew(client)
        .with_rate_limiter(limiter)
        .with_artifact_sink(Arc::new(FsArtifactSink::new(&config.artifacts_dir)))
        .build()
        .expect("the academic crew is a valid pipeline");
    let chat = CrewChat::new(Arc::new(pipeline), config.prompt_selector());
    let mut session = config.new_session().expect("memory window is valid");

    println!("Bem-vindo ao chat com 3 agentes (modelo {}).", config.model.as_str());
    let mut attachments: Vec<Attachment> = Vec::new();

    loop {
        print!("\nFaça uma pergunta: ");
        io::stdout().flush().unwrap();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).expect("Failed to read line") == 0 {
            break;
        }
        let line = line.trim();

        if let Some(path) = line.strip_prefix(":attach ") {
            match std::fs::read(path.trim()) {
                Ok(bytes) => match Attachment::new(path.trim(), None, bytes) {
                    Ok(attachment) => {
                        println!("Anexado: {}", attachment.file_name());
                        attachments.push(attachment);
                    }
                    Err(e) => println!("Aviso: {}", e),
                },
                Err(e) => println!("Aviso: {}", e),
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let (tx, rx) = watch::channel(true);
        tokio::spawn(display_waiting_dots(rx, 3));

        let result = chat
            .ask_with_attachments(&mut session, line, &attachments)
            .await;
        tx.send(false).unwrap();

        match result {
            Ok(reply) => {
                for notice in &reply.notices {
                    println!("Aviso: {}", notice);
                }
                println!("\nChatbot:\n{}\n", reply.answer);
                attachments.clear();
            }
            Err(e) => {
                for notice in e.notices() {
                    println!("Aviso: {}", notice);
                }
                println!("Erro: {}", e);
            }
        }
    }
}

async fn display_waiting_dots(rx: watch::Receiver<bool>, num_dots: usize) {
    while *rx.borrow() {
        for _ in 0..num_dots {
            if !*rx.borrow() {
                break;
            }
            print!(".");
            io::stdout().flush().unwrap();
            sleep(Duration::from_millis(500)).await;
        }
        print!("\r{}\r", " ".repeat(num_dots));
        io::stdout().flush().unwrap();
    }
}

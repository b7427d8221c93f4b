// oracle_leaks/oracle_client/src/main.rs

use std::fmt;
use anyhow::Context;
use clap::{Parser, Subcommand};
use clearscreen::clear;
use inquire::{Select, Text};
use log::LevelFilter;
use num_bigint::BigUint;
use serde::Serialize;
use shared_crypto::{byte_length_of, hex_decode, hex_encode, unpad};
use oracle_client::{recover_padded, OracleClient};

#[derive(Parser, Debug)]
#[command(name = "oracle_client", version, about = "Client and attack driver for the RSA length oracle")]
struct Cli {
    /// Oracle address
    #[arg(short, long, default_value = "127.0.0.1:1337")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the server's public key (option 1)
    PublicKey,
    /// Print the encrypted secret (option 2)
    Secret,
    /// Ask for the decryption length of a hex ciphertext (option 3)
    Length { ciphertext: String },
    /// Recover the secret from length answers alone
    Attack {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Menu driven session
    Interactive,
}

#[derive(Serialize, Debug)]
struct AttackReport {
    padded_hex: String,
    secret_hex: Option<String>,
    secret_text: Option<String>,
    queries: u64,
}

async fn run_attack(client: &mut OracleClient) -> anyhow::Result<AttackReport> {
    let (n, e) = client.public_key_numbers().await.context("cannot fetch the public key")?;
    let ciphertext_hex = client.encrypted_secret().await.context("cannot fetch the encrypted secret")?;
    let ciphertext = BigUint::from_bytes_be(&hex_decode(&ciphertext_hex)?);

    let recovery = recover_padded(client, &n, &e, &ciphertext).await?;
    let secret = unpad(&recovery.padded, byte_length_of(&n)).ok();
    Ok(AttackReport {
        padded_hex: hex_encode(&recovery.padded.to_bytes_be()),
        secret_hex: secret.as_deref().map(hex_encode),
        secret_text: secret.as_deref().map(|s| String::from_utf8_lossy(s).into_owned()),
        queries: recovery.queries,
    })
}

fn print_report(report: &AttackReport) {
    println!("Padded block: {}", report.padded_hex);
    match (&report.secret_text, &report.secret_hex) {
        (Some(text), Some(hex)) => {
            println!("Secret (hex): {}", hex);
            println!("Secret: {}", text);
        }
        _ => println!("Recovered block does not unpad cleanly."),
    }
    println!("Oracle queries: {}", report.queries);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuEntry {
    PublicKey,
    EncryptedSecret,
    Length,
    Recover,
    Exit,
}

impl MenuEntry {
    const ALL: [MenuEntry; 5] = [
        MenuEntry::PublicKey,
        MenuEntry::EncryptedSecret,
        MenuEntry::Length,
        MenuEntry::Recover,
        MenuEntry::Exit,
    ];
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuEntry::PublicKey => "1. Get public key",
            MenuEntry::EncryptedSecret => "2. Get encrypted secret",
            MenuEntry::Length => "3. Get decryption length",
            MenuEntry::Recover => "4. Recover the secret",
            MenuEntry::Exit => "5. Exit",
        };
        f.write_str(label)
    }
}

async fn interactive(client: &mut OracleClient) -> anyhow::Result<()> {
    loop {
        clear().unwrap_or_else(|e| eprintln!("Cannot clear the screen: {}", e));
        let choice = match Select::new("What do you want to do?", MenuEntry::ALL.to_vec()).prompt() {
            Ok(choice) => choice,
            Err(e) => {
                eprintln!("Cannot read the selection: {}. Exiting.", e);
                break;
            }
        };
        let outcome = match choice {
            MenuEntry::PublicKey => client.public_key().await.map(|key| {
                println!("n = {}", key.n);
                println!("e = {}", key.e);
            }).map_err(anyhow::Error::from),
            MenuEntry::EncryptedSecret => client.encrypted_secret().await.map(|hex| {
                println!("Encrypted secret: {}", hex);
            }).map_err(anyhow::Error::from),
            MenuEntry::Length => {
                let ciphertext = Text::new("Ciphertext (hex):").prompt().unwrap_or_default();
                client.length(ciphertext.trim()).await.map(|len| {
                    println!("Length: {}", len);
                }).map_err(anyhow::Error::from)
            }
            MenuEntry::Recover => run_attack(client).await.map(|report| print_report(&report)),
            MenuEntry::Exit => break,
        };
        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
        println!("\nPress Enter to continue...");
        let mut pause = String::new();
        std::io::stdin().read_line(&mut pause)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let mut client = OracleClient::connect(&cli.addr)
        .await
        .with_context(|| format!("cannot connect to {}", cli.addr))?;

    match cli.command {
        Command::PublicKey => {
            let key = client.public_key().await?;
            println!("(n,e): ('{}', '{}')", key.n, key.e);
        }
        Command::Secret => println!("{}", client.encrypted_secret().await?),
        Command::Length { ciphertext } => println!("{}", client.length(ciphertext.trim()).await?),
        Command::Attack { json } => {
            let report = run_attack(&mut client).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Interactive => interactive(&mut client).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_labels_are_numbered_in_order() {
        for (i, entry) in MenuEntry::ALL.iter().enumerate() {
            assert!(entry.to_string().starts_with(&format!("{}. ", i + 1)), "{}", entry);
        }
        assert_eq!(MenuEntry::ALL.last(), Some(&MenuEntry::Exit));
    }
}

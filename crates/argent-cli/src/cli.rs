use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "argent",
    about = "Argent: per-identity hash-chained ledgers",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with `[store]` and `[ledger]` tables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the config file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SchemeArg {
    Ec,
    Pq,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a key pair and print its address
    Keygen(KeygenArgs),
    /// Print the address for a seed
    Address(SeedArgs),
    /// Check an address's markers, padding and checksum
    Validate(ValidateArgs),
    /// Open the account for a seed and create its native ledger
    Open(SeedArgs),
    /// Append a send to your ledger
    Send(SendArgs),
    /// Claim a send addressed to you
    Claim(ClaimArgs),
    /// Grant trust to another identity
    Trust(TrustArgs),
    /// Show a ledger's transactions
    Log(LogArgs),
    /// Audit a stored ledger end to end
    Verify(VerifyArgs),
    /// Sign the current rolling hash of your ledger
    SignLedger(SignLedgerArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    #[arg(long, value_enum, default_value = "ec")]
    pub scheme: SchemeArg,
    /// 32-byte hex seed (EC only); random when absent
    #[arg(long)]
    pub seed: Option<String>,
}

#[derive(Args)]
pub struct SeedArgs {
    /// 32-byte hex seed of an EC key pair
    #[arg(long)]
    pub seed: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub address: String,
}

#[derive(Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub key: SeedArgs,
    #[arg(long)]
    pub to: String,
    /// Your balance after the transfer
    #[arg(long)]
    pub balance: u64,
    #[arg(long, default_value = "ART")]
    pub ticker: String,
}

#[derive(Args)]
pub struct ClaimArgs {
    #[command(flatten)]
    pub key: SeedArgs,
    /// Hash of the send being claimed
    pub send: String,
}

#[derive(Args)]
pub struct TrustArgs {
    #[command(flatten)]
    pub key: SeedArgs,
    #[arg(long)]
    pub to: String,
    /// Expiry as Unix nanoseconds; 0 never expires
    #[arg(long, default_value = "0", conflicts_with = "expires_in")]
    pub expiration: i64,
    /// Expiry relative to now, in seconds
    #[arg(long)]
    pub expires_in: Option<i64>,
}

#[derive(Args)]
pub struct LogArgs {
    pub address: String,
    #[arg(long, default_value = "ART")]
    pub ticker: String,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub address: String,
    #[arg(long, default_value = "ART")]
    pub ticker: String,
    /// Skip transaction and ledger signature checks
    #[arg(long)]
    pub no_signatures: bool,
}

#[derive(Args)]
pub struct SignLedgerArgs {
    #[command(flatten)]
    pub key: SeedArgs,
    #[arg(long, default_value = "ART")]
    pub ticker: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "0101010101010101010101010101010101010101010101010101010101010101";

    #[test]
    fn parse_keygen_defaults_to_ec() {
        let cli = Cli::try_parse_from(["argent", "keygen"]).unwrap();
        if let Command::Keygen(args) = cli.command {
            assert_eq!(args.scheme, SchemeArg::Ec);
            assert!(args.seed.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_keygen_pq() {
        let cli = Cli::try_parse_from(["argent", "keygen", "--scheme", "pq"]).unwrap();
        if let Command::Keygen(args) = cli.command {
            assert_eq!(args.scheme, SchemeArg::Pq);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_send() {
        let cli = Cli::try_parse_from([
            "argent", "send", "--seed", SEED, "--to", "666X", "--balance", "7",
        ])
        .unwrap();
        if let Command::Send(args) = cli.command {
            assert_eq!(args.key.seed, SEED);
            assert_eq!(args.to, "666X");
            assert_eq!(args.balance, 7);
            assert_eq!(args.ticker, "ART");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_claim() {
        let cli = Cli::try_parse_from(["argent", "claim", "--seed", SEED, "0abc"]).unwrap();
        if let Command::Claim(args) = cli.command {
            assert_eq!(args.send, "0abc");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn trust_expiration_forms_conflict() {
        let parsed = Cli::try_parse_from([
            "argent",
            "trust",
            "--seed",
            SEED,
            "--to",
            "x",
            "--expiration",
            "5",
            "--expires-in",
            "60",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_log_oneline() {
        let cli = Cli::try_parse_from(["argent", "log", "666X", "--oneline", "-n", "5"]).unwrap();
        if let Command::Log(args) = cli.command {
            assert!(args.oneline);
            assert_eq!(args.limit, 5);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_sign_ledger() {
        let cli =
            Cli::try_parse_from(["argent", "sign-ledger", "--seed", SEED, "--ticker", "GLD"]).unwrap();
        if let Command::SignLedger(args) = cli.command {
            assert_eq!(args.ticker, "GLD");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "argent",
            "--verbose",
            "--root",
            "/tmp/ledgers",
            "--format",
            "json",
            "validate",
            "x",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/ledgers")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}

use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use argent_crypto::{AddressCodec, KeyPair, SignatureProvider};
use argent_ledger::{builder, now_nanos, LedgerService, StreamValidator};
use argent_store::{BlobLedgerStore, FsBlobStore};
use argent_types::{Address, Currency, Scheme, Transaction, TxBody};

use crate::cli::*;
use crate::config::CliConfig;

type Service = LedgerService<BlobLedgerStore<FsBlobStore>>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        config,
        root,
        ..
    } = cli;
    let config = CliConfig::resolve(config.as_deref(), root)?;

    match command {
        Command::Keygen(args) => cmd_keygen(args, &format),
        Command::Address(args) => cmd_address(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Open(args) => cmd_open(&service(&config)?, args),
        Command::Send(args) => cmd_send(&service(&config)?, args),
        Command::Claim(args) => cmd_claim(&service(&config)?, args),
        Command::Trust(args) => cmd_trust(&service(&config)?, args),
        Command::Log(args) => cmd_log(&service(&config)?, args, &format),
        Command::Verify(args) => cmd_verify(&service(&config)?, args),
        Command::SignLedger(args) => cmd_sign_ledger(&service(&config)?, args),
    }
}

fn service(config: &CliConfig) -> anyhow::Result<Service> {
    debug!(root = %config.store.root.display(), "opening ledger store");
    let store = BlobLedgerStore::open(config.store.clone())
        .with_context(|| format!("opening store at {}", config.store.root.display()))?;
    Ok(LedgerService::new(store, config.ledger.clone()))
}

fn parse_seed(text: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = hex::decode(text.trim()).context("seed is not hex")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("seed must be 32 bytes, got {len}"))
}

fn keypair(args: &SeedArgs) -> anyhow::Result<KeyPair> {
    let seed = parse_seed(&args.seed)?;
    Ok(KeyPair::from_seed(Scheme::Ec, &seed)?)
}

fn head_of(service: &Service, owner: &Address, ticker: &str) -> anyhow::Result<(String, Currency)> {
    let record = service
        .ledger(owner, ticker)?
        .with_context(|| format!("{} has no {ticker} ledger; run `argent open` first", owner.short()))?;
    let head = record
        .head()
        .map(|t| t.hash.clone())
        .context("ledger is empty")?;
    Ok((head, record.currency))
}

fn parse_address(text: &str) -> anyhow::Result<Address> {
    let address = Address::new(text.trim());
    AddressCodec::parse(&address).with_context(|| format!("invalid address {text}"))?;
    Ok(address)
}

fn cmd_keygen(args: KeygenArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (keypair, seed) = match args.scheme {
        SchemeArg::Ec => {
            let seed = match &args.seed {
                Some(text) => parse_seed(text)?,
                None => rand::random::<[u8; 32]>(),
            };
            (KeyPair::from_seed(Scheme::Ec, &seed)?, Some(seed))
        }
        SchemeArg::Pq => {
            if args.seed.is_some() {
                bail!("seeded key generation is only available for EC keys");
            }
            (KeyPair::generate(Scheme::PostQuantum)?, None)
        }
    };

    match format {
        OutputFormat::Json => {
            let out = json!({
                "scheme": keypair.scheme().to_string(),
                "address": keypair.address().to_string(),
                "public_key": hex::encode(keypair.public_key()),
                "seed": seed.map(hex::encode),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{} Generated {} key pair", "✓".green().bold(), keypair.scheme());
            println!("  Address:    {}", keypair.address().to_string().cyan());
            println!("  Public key: {}", hex::encode(keypair.public_key()).dimmed());
            match seed {
                Some(seed) => println!("  Seed:       {}", hex::encode(seed).yellow()),
                None => println!("  {}", "Secret key is not retained.".yellow()),
            }
        }
    }
    Ok(())
}

fn cmd_address(args: SeedArgs) -> anyhow::Result<()> {
    println!("{}", keypair(&args)?.address());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let address = Address::new(args.address.trim());
    match AddressCodec::parse(&address) {
        Ok(parsed) => {
            println!("{} valid {} address", "✓".green().bold(), parsed.scheme);
            Ok(())
        }
        Err(err) => {
            println!("{} invalid address: {err}", "✗".red().bold());
            bail!("address failed validation")
        }
    }
}

fn cmd_open(service: &Service, args: SeedArgs) -> anyhow::Result<()> {
    let kp = keypair(&args)?;
    let owner = kp.address();
    service.open_account(&owner, kp.public_key(), kp.scheme())?;

    let ticker = Currency::NATIVE_TICKER;
    if service.ledger(&owner, ticker)?.is_none() {
        let genesis = builder::sign_with(builder::create_native(&owner)?, &kp)?;
        let appended = service.append(&owner, ticker, genesis)?;
        println!("{} Opened {}", "✓".green().bold(), owner.to_string().cyan());
        println!("  Genesis: {}", appended.hash.yellow());
        println!("  Rolling: {}", appended.rolling_hash.dimmed());
    } else {
        println!("Account {} already open", owner.to_string().cyan());
    }
    Ok(())
}

fn cmd_send(service: &Service, args: SendArgs) -> anyhow::Result<()> {
    let kp = keypair(&args.key)?;
    let owner = kp.address();
    let destination = parse_address(&args.to)?;
    let (head, currency) = head_of(service, &owner, &args.ticker)?;

    let tx = builder::send(&owner, &head, &destination, args.balance, currency)?;
    let appended = service.append(&owner, &args.ticker, builder::sign_with(tx, &kp)?)?;
    println!(
        "{} Sent to {} (balance now {})",
        "✓".green().bold(),
        destination.short().cyan(),
        args.balance
    );
    println!("  Hash:    {}", appended.hash.yellow());
    println!("  Rolling: {}", appended.rolling_hash.dimmed());
    Ok(())
}

fn cmd_claim(service: &Service, args: ClaimArgs) -> anyhow::Result<()> {
    let kp = keypair(&args.key)?;
    let owner = kp.address();
    let referenced = service
        .find_transaction(&args.send)?
        .with_context(|| format!("no stored transaction {}", args.send))?;
    let ticker = referenced
        .currency()
        .map(|c| c.ticker.clone())
        .context("referenced transaction carries no currency")?;
    let (head, _) = head_of(service, &owner, &ticker)?;

    let tx = builder::claim(&owner, &head, &args.send)?;
    let appended = service.append(&owner, &ticker, builder::sign_with(tx, &kp)?)?;
    println!("{} Claimed {} in {}", "✓".green().bold(), args.send.yellow(), ticker.bold());
    println!("  Hash:    {}", appended.hash.yellow());
    println!("  Rolling: {}", appended.rolling_hash.dimmed());
    Ok(())
}

fn cmd_trust(service: &Service, args: TrustArgs) -> anyhow::Result<()> {
    let kp = keypair(&args.key)?;
    let owner = kp.address();
    let destination = parse_address(&args.to)?;
    let expiration = match args.expires_in {
        Some(seconds) => now_nanos().saturating_add(seconds.saturating_mul(1_000_000_000)),
        None => args.expiration,
    };
    let ticker = Currency::NATIVE_TICKER;
    let (head, _) = head_of(service, &owner, ticker)?;

    let tx = builder::trust(&owner, &head, &destination, expiration)?;
    let appended = service.append(&owner, ticker, builder::sign_with(tx, &kp)?)?;
    println!(
        "{} Trusted {} until {}",
        "✓".green().bold(),
        destination.short().cyan(),
        describe_expiration(expiration)
    );
    println!("  Hash: {}", appended.hash.yellow());
    Ok(())
}

fn describe_expiration(nanos: i64) -> String {
    if nanos == 0 {
        "forever".into()
    } else {
        Utc.timestamp_nanos(nanos).to_rfc3339()
    }
}

fn describe(tx: &Transaction) -> String {
    match &tx.body {
        TxBody::Create {
            balance, currency, ..
        } => format!("create {} {}", balance, currency.ticker),
        TxBody::Send {
            balance,
            destination,
            ..
        } => format!("send to {} (balance {balance})", destination.short()),
        TxBody::Claim { origin, .. } => format!("claim {origin}"),
        TxBody::Trust {
            destination,
            expiration,
            ..
        } => {
            let until = expiration
                .parse::<i64>()
                .map(describe_expiration)
                .unwrap_or_else(|_| expiration.clone());
            format!("trust {} until {until}", destination.short())
        }
    }
}

fn cmd_log(service: &Service, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let owner = parse_address(&args.address)?;
    let record = service
        .ledger(&owner, &args.ticker)?
        .with_context(|| format!("{} has no {} ledger", owner.short(), args.ticker))?;
    let total = record.len();
    let shown: Vec<(usize, &Transaction)> = record
        .transactions
        .iter()
        .enumerate()
        .rev()
        .take(args.limit)
        .collect();

    if let OutputFormat::Json = format {
        let txs: Vec<&Transaction> = shown.iter().map(|(_, tx)| *tx).collect();
        println!("{}", serde_json::to_string_pretty(&txs)?);
        return Ok(());
    }

    for (index, tx) in shown {
        let label = format!("#{}", index + 1);
        if args.oneline {
            println!("{} {} {}", label.yellow(), short_hash(&tx.hash).dimmed(), describe(tx));
        } else {
            println!("{}  {}", label.yellow().bold(), tx.hash.dimmed());
            println!("  {}", describe(tx));
            if tx.is_signed() {
                println!("  {}", "signed".green());
            } else {
                println!("  {}", "unsigned".red());
            }
        }
    }
    if !args.oneline {
        println!("\n{} of {} transactions, rolling hash {}", total.min(args.limit), total, record.hash.cyan());
    }
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    hash.get(..13).unwrap_or(hash)
}

fn flag(ok: bool) -> colored::ColoredString {
    if ok {
        "valid".green()
    } else {
        "INVALID".red().bold()
    }
}

fn cmd_verify(service: &Service, args: VerifyArgs) -> anyhow::Result<()> {
    let owner = parse_address(&args.address)?;
    let report = if args.no_signatures {
        let record = service
            .ledger(&owner, &args.ticker)?
            .with_context(|| format!("{} has no {} ledger", owner.short(), args.ticker))?;
        StreamValidator::validate(&record)
    } else {
        service.audit(&owner, &args.ticker)?
    };

    println!("Ledger {} / {} ({} transactions)", owner.short().cyan(), report.ticker.bold(), report.transaction_count);
    println!("  Genesis:      {}", flag(report.genesis_valid));
    println!("  Links:        {}", flag(report.links_valid));
    println!("  Hashes:       {}", flag(report.hashes_valid));
    println!("  Ownership:    {}", flag(report.owner_consistent));
    println!("  Rolling hash: {}", flag(report.rolling_hash_valid));
    if let Some(ok) = report.signatures_valid {
        println!("  Signatures:   {}", flag(ok));
    }

    if report.is_valid() {
        println!("{} Ledger integrity verified", "✓".green().bold());
        return Ok(());
    }
    for violation in &report.violations {
        let at = violation
            .index
            .map(|i| format!("#{}", i + 1))
            .unwrap_or_else(|| "ledger".into());
        println!("  {} {at}: {:?}: {}", "✗".red(), violation.kind, violation.description);
    }
    bail!("{} violation(s) found", report.violations.len())
}

fn cmd_sign_ledger(service: &Service, args: SignLedgerArgs) -> anyhow::Result<()> {
    let kp = keypair(&args.key)?;
    let owner = kp.address();
    let record = service
        .ledger(&owner, &args.ticker)?
        .with_context(|| format!("{} has no {} ledger", owner.short(), args.ticker))?;
    let signature = SignatureProvider::sign(&kp, record.hash.as_bytes())?;
    service.update_signature(&owner, &args.ticker, signature, kp.scheme())?;
    println!("{} Signed rolling hash {}", "✓".green().bold(), record.hash.cyan());
    Ok(())
}

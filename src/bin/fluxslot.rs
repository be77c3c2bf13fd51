use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use fluxslot::{
    AssetItem, GeneratorSpec, MotionPreference, RuntimeInputs, SLOT_ID_ATTR, SlotNode, SlotPatch,
    TransitionEngine, TransitionKind, advance_slot_playback_state, format_refresh_policy,
    format_transition, parse_refresh_policy, parse_transition, render_html, simulate_slot_changes,
};

#[derive(Parser, Debug)]
#[command(name = "fluxslot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a policy or transition string and print its normalized form.
    Parse(ParseArgs),
    /// List a slot's upcoming changes.
    Simulate(SimulateArgs),
    /// Print the patched HTML projection of a slot at the given runtime.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// The policy/transition text, e.g. "chance(0.25, docstep)".
    text: String,

    /// What grammar to parse the text with.
    #[arg(long, value_enum, default_value_t = GrammarChoice::Policy)]
    grammar: GrammarChoice,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input slot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Determinism seed.
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Wallclock time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Docstep counter.
    #[arg(long, default_value_t = 0)]
    docstep: u64,

    /// Number of upcoming changes to list.
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input slot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Determinism seed.
    #[arg(long, default_value_t = 0)]
    seed: u32,

    /// Wallclock time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Docstep counter.
    #[arg(long, default_value_t = 0)]
    docstep: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GrammarChoice {
    Policy,
    Transition,
}

/// One slot as stored by the editor: identity, policy text, generator spec,
/// optional transition text, and the asset table it may pick from.
#[derive(Debug, serde::Deserialize)]
struct SlotDoc {
    slot_id: String,
    refresh: String,
    #[serde(default)]
    generator: Option<GeneratorSpec>,
    #[serde(default)]
    transition: Option<String>,
    #[serde(default)]
    assets: Vec<AssetItem>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Parse(args) => cmd_parse(args),
        Command::Simulate(args) => cmd_simulate(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn read_slot_json(path: &PathBuf) -> anyhow::Result<SlotDoc> {
    let f = File::open(path).with_context(|| format!("open slot '{}'", path.display()))?;
    let r = BufReader::new(f);
    let doc: SlotDoc = serde_json::from_reader(r).with_context(|| "parse slot JSON")?;
    Ok(doc)
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    match args.grammar {
        GrammarChoice::Policy => {
            let policy = parse_refresh_policy(&args.text)
                .with_context(|| format!("unrecognized refresh policy '{}'", args.text))?;
            println!("{}", serde_json::to_string_pretty(&policy)?);
            eprintln!("canonical: {}", format_refresh_policy(&policy));
        }
        GrammarChoice::Transition => {
            let spec = parse_transition(&args.text)
                .with_context(|| format!("unrecognized transition '{}'", args.text))?;
            println!("{}", serde_json::to_string_pretty(&spec)?);
            eprintln!("canonical: {}", format_transition(&spec));
        }
    }
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let doc = read_slot_json(&args.in_path)?;
    let policy = parse_refresh_policy(&doc.refresh)
        .with_context(|| format!("unrecognized refresh policy '{}'", doc.refresh))?;
    policy.validate()?;
    let spec = doc.generator.unwrap_or(GeneratorSpec::Every);
    let runtime = RuntimeInputs::new(args.seed, args.time, args.docstep);

    let changes = simulate_slot_changes(
        &spec,
        &policy,
        &runtime,
        &doc.slot_id,
        &doc.assets,
        args.count,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    println!(
        "{:>8}  {:>8}  {:>10}  {:>8}  value",
        "bucket", "event", "time", "docstep"
    );
    for c in &changes {
        let value = match &c.value {
            fluxslot::SlotValue::Text { text } => text.clone(),
            fluxslot::SlotValue::Asset { label, .. } => format!("[asset] {label}"),
        };
        println!(
            "{:>8}  {:>8}  {:>10.3}  {:>8}  {}",
            c.bucket, c.event_index, c.runtime.time_sec, c.runtime.docstep, value
        );
    }
    if changes.len() < args.count {
        eprintln!("(policy stops firing after {} changes)", changes.len());
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_slot_json(&args.in_path)?;
    let policy = parse_refresh_policy(&doc.refresh)
        .with_context(|| format!("unrecognized refresh policy '{}'", doc.refresh))?;
    policy.validate()?;
    let transition = match &doc.transition {
        None => TransitionKind::None,
        Some(text) => parse_transition(text)
            .with_context(|| format!("unrecognized transition '{text}'"))?,
    };
    transition.validate()?;
    let runtime = RuntimeInputs::new(args.seed, args.time, args.docstep);

    let adv = advance_slot_playback_state(
        None,
        doc.generator.as_ref(),
        &policy,
        &runtime,
        &doc.slot_id,
        &doc.assets,
    );

    let mut outer = SlotNode::new("span").with_attr(SLOT_ID_ATTR, doc.slot_id.clone());
    // A one-shot render has no animation frames to drive, so patch reduced.
    let mut engine = TransitionEngine::new(MotionPreference::Reduced);
    engine.apply(
        &mut outer,
        SlotPatch::from_value(&adv.state.value),
        &transition,
        0.0,
        None,
    );
    println!("{}", render_html(&outer));
    Ok(())
}

use clap::{ArgAction, Parser as ClapParser, Subcommand};
use log::{LevelFilter, error, info};
use std::process;

use strand::{
    BuiltinResult, HeapCreateInfo, Instruction, Node, ThreadState, VMCreateInfo, Vm, VmResult,
    record_like,
};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Raise the log level (-v debug, -vv trace). Defaults to RUST_LOG.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[arg(long, help = "Initial record and variable capacity of the heap")]
    heap_capacity: Option<usize>,

    #[arg(long, help = "Allocations between automatic collections")]
    gc_threshold: Option<usize>,

    #[arg(long, help = "Instructions a thread runs before yielding")]
    quantum: Option<usize>,

    #[arg(long, help = "Nesting depth printed before values are elided")]
    print_depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a producer and a consumer thread that meet on a dataflow variable
    Demo,
    /// Intern the given words and show which of them share an identity
    Intern { words: Vec<String> },
    /// Allocate garbage and collect it
    Collect {
        #[arg(default_value_t = 1000)]
        records: usize,
    },
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn demo(vm: &mut Vm) -> VmResult<()> {
    let feature = vm.new_variable();
    let atom = vm.new_atom("foo");
    let label = vm.new_atom("point");
    let fx = vm.new_atom("x");
    let point = vm.build_record(label, vec![(fx.clone(), Node::int(3))])?;

    // consumer: waits for the feature, then selects it from the record
    let consumer = vm.spawn(
        vec![
            Instruction::call("dot", &[0, 1], &[2])?,
            Instruction::call("show", &[2], &[])?,
            Instruction::call("dot", &[3, 1], &[2])?,
        ],
        vec![point, feature.into(), Node::unit(), atom],
    )?;
    let producer = vm.spawn(
        vec![Instruction::call("bind", &[0, 1], &[])?],
        vec![feature.into(), fx],
    )?;

    let report = vm.run_until_idle();
    print!("{}", vm.take_output());
    for id in [consumer, producer] {
        match vm.thread(id).map(|thread| thread.state()) {
            Some(ThreadState::Failed(exception)) => {
                println!("thread {} raised {}", id.0, vm.repr(exception))
            }
            Some(state) => println!("thread {} is {:?}", id.0, state),
            None => println!("thread {} is gone", id.0),
        }
    }
    info!("demo finished after {} slices", report.slices);
    Ok(())
}

fn intern(vm: &mut Vm, words: &[String]) {
    let atoms: Vec<Node> = words.iter().map(|word| vm.new_atom(word)).collect();
    for (index, atom) in atoms.iter().enumerate() {
        let first = atoms
            .iter()
            .position(|other| vm.equals(atom, other))
            .unwrap_or(index);
        let mut width = Node::default();
        // atoms are zero-width records
        let shown = match record_like::width(vm, atom, &mut width) {
            BuiltinResult::Proceed => vm.repr(&width).to_string(),
            other => format!("{other:?}"),
        };
        println!("{} -> identity #{} (width {})", vm.repr(atom), first, shown);
    }
    println!("{} distinct atoms", vm.atoms().len());
}

fn collect(vm: &mut Vm, records: usize) -> VmResult<()> {
    let label = vm.new_atom("kept");
    let kept = vm.build_tuple(label, vec![Node::int(records as i64)])?;
    let slot = vm.add_root(kept);
    for index in 0..records {
        let label = vm.new_atom("garbage");
        vm.build_tuple(label, vec![Node::int(index as i64)])?;
    }
    let stats = vm.collect_garbage();
    println!(
        "records {} -> {}, atoms {} -> {}",
        stats.records_before, stats.records_after, stats.atoms_before, stats.atoms_after
    );
    if let Some(kept) = vm.root(slot) {
        println!("root survived as {}", vm.repr(kept));
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut vm = Vm::new(VMCreateInfo {
        heap: HeapCreateInfo {
            initial_capacity: cli.heap_capacity,
            gc_threshold: cli.gc_threshold,
        },
        quantum: cli.quantum,
        print_depth: cli.print_depth,
    });

    let result = match &cli.command {
        Command::Demo => demo(&mut vm),
        Command::Intern { words } => {
            intern(&mut vm, words);
            Ok(())
        }
        Command::Collect { records } => collect(&mut vm, *records),
    };
    if let Err(err) = result {
        error!("{err}");
        process::exit(1);
    }
}

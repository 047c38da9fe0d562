use clap::Parser;
use clap_num::maybe_hex;
use lazy_static::lazy_static;

#[derive(Parser, Debug)]
#[command(author,version,about,long_about=None)]
pub struct Args {
    /// Assembly (.asm, .s) file to assemble/run
    pub file: String,

    /// Dump registers and non-zero memory after the run
    #[arg(short, long)]
    pub dump: bool,

    /// Write the program listing to stdout after assembly
    #[arg(short, long)]
    pub list: bool,

    /// Run the program and evaluate any test criteria
    #[arg(short, long)]
    pub run: bool,

    /// Maximum call stack depth (hex ok with '0x')
    #[arg(long,value_parser=maybe_hex::<u64>, default_value_t=1024)]
    pub stack_limit: u64,

    /// Trace each instruction as it is executed
    #[arg(short, long)]
    pub trace: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

lazy_static! {
    pub static ref ARGS: Args = if cfg!(test) {
        // manually set parameters for running tests
        Args::parse_from(["test", "test", "--run"])
    } else {
        Args::parse()
    };
}

pub fn init() {}
pub fn run() -> bool { ARGS.run }

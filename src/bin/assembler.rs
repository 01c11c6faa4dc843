use mmn14asm::driver;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <input1> [input2] ...", args[0]);
        std::process::exit(1);
    }

    let exit_code = driver::run(&args[1..]);
    std::process::exit(exit_code);
}

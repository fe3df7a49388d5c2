use std::{env, path::Path, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    let program = args.first().map_or("cart-image", String::as_str);

    if args.len() < 2 || args.len() > 3 {
        println!("Usage: {} file size.bin", program);
        println!("Usage: {} file", program);
        process::exit(1);
    }

    match cart_image::package(Path::new(&args[1]), args.get(2).map(Path::new)) {
        Ok(size) => print!("{}", size),
        Err(err) => {
            eprintln!("{}: {}", args[1], err);
            process::exit(1);
        }
    }
}

use clap::{arg,crate_version,Command};
use shortstream::Codec;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            return true;
        }
        return false;
    }
    true
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Each file is handled as a single message on a fresh model.
Expand with the same token length that was used to compress.

Examples:
---------
Compress:      `shortstream compress -i my_messages.json -o my_compressed`
Expand:        `shortstream expand -i my_compressed -o my_messages.json`";

    let mut main_cmd = Command::new("shortstream")
        .about("Compress and expand short text messages with an adaptive Huffman tree")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-t --tokens <LEN> "maximum token length, 1 to 16").value_parser(clap::value_parser!(usize))
            .default_value("10"))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .arg(arg!(-t --tokens <LEN> "maximum token length, 1 to 16").value_parser(clap::value_parser!(usize))
            .default_value("10"))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let tokens = cmd.get_one::<usize>("tokens").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let dat = std::fs::read(path_in)?;
        let mut codec = Codec::new(*tokens)?;
        let packed = codec.compress_bytes(&dat)?;
        log::info!("model learned {} symbols",codec.symbol_count());
        std::fs::write(path_out,&packed)?;
        eprintln!("compressed {} into {}",dat.len(),packed.len());
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let tokens = cmd.get_one::<usize>("tokens").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let dat = std::fs::read(path_in)?;
        let mut codec = Codec::new(*tokens)?;
        let expanded = codec.decompress_bytes(&dat)?;
        std::fs::write(path_out,&expanded)?;
        eprintln!("expanded {} into {}",dat.len(),expanded.len());
    }

    Ok(())
}

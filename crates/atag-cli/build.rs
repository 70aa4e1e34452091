use std::fs;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

// cli.rs only needs clap + clap_complete, both listed as
// build-dependencies, so it can be included without the rest of the crate.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let out_dir = Path::new(&out_dir);

    let mut cmd = cli::Cli::command();
    write_manpages(&cmd, &out_dir.join("man"));
    write_completions(&mut cmd, &out_dir.join("completions"));
}

/// Man pages for the root command and every visible subcommand, flattened
/// into `atag.1`, `atag-status.1`, `atag-config-init.1`, and so on.
fn write_manpages(root: &clap::Command, dir: &Path) {
    fs::create_dir_all(dir).expect("failed to create man output directory");

    let mut queue = vec![root.clone()];
    while let Some(cmd) = queue.pop() {
        let name = cmd.get_name().to_owned();
        for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
            queue.push(sub.clone().name(format!("{name}-{}", sub.get_name())));
        }

        let mut page = Vec::new();
        clap_mangen::Man::new(cmd)
            .render(&mut page)
            .unwrap_or_else(|e| panic!("failed to render man page for `{name}`: {e}"));
        fs::write(dir.join(format!("{name}.1")), page)
            .unwrap_or_else(|e| panic!("failed to write man page for `{name}`: {e}"));
    }
}

/// Pre-generated completion scripts for the shells packagers usually ship;
/// `atag completions` stays available for everything else.
fn write_completions(cmd: &mut clap::Command, dir: &Path) {
    fs::create_dir_all(dir).expect("failed to create completions output directory");

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, cmd, "atag", dir)
            .unwrap_or_else(|e| panic!("failed to generate {shell} completions: {e}"));
    }
}

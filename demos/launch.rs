use std::{collections::HashMap, env, process::Command};

use environ_freeze::{DiffChannel, freeze, setup};

const CHILD_FLAG: &str = "--child";

fn main() -> anyhow::Result<()> {
    env_logger::init();
    if env::args().any(|a| a == CHILD_FLAG) {
        return child();
    }

    let mut child_env: HashMap<String, String> = env::vars().collect();
    child_env.insert("DEMO".to_string(), "one".to_string());
    freeze(&mut child_env, ["DEMO"])?;
    child_env.insert("DEMO".to_string(), "two".to_string());
    println!(
        "launcher: DEMO=two, channel {}={}",
        DiffChannel::default().key(),
        child_env[DiffChannel::default().key()]
    );

    let status = Command::new(env::current_exe()?)
        .arg(CHILD_FLAG)
        .env_clear()
        .envs(&child_env)
        .status()?;
    anyhow::ensure!(status.success(), "child exited with {status}");
    Ok(())
}

fn child() -> anyhow::Result<()> {
    setup();
    // prints: one
    println!("child: DEMO={}", env::var("DEMO")?);
    Ok(())
}

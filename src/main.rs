//! nagare-client
//!
//! Loads a page, runs its scripts, replays clicks on elements by id and
//! prints the resulting document.
//!
//! ```text
//! nagare-client <url> [--click <element-id>]...
//! ```

use nagare_client::network::ReqwestClient;
use nagare_client::{ClickEvent, Result, Runtime, RuntimeConfig, NAME, VERSION};
use std::env;
use std::rc::Rc;

struct Args {
    url: String,
    clicks: Vec<String>,
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1)) {
        Some(args) => args,
        None => {
            eprintln!("{} v{}", NAME, VERSION);
            eprintln!("usage: {} <url> [--click <element-id>]...", NAME);
            std::process::exit(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let local = tokio::task::LocalSet::new();
    if let Err(e) = local.block_on(&runtime, run(args)) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let url = args.next().filter(|a| !a.starts_with('-'))?;
    let mut clicks = Vec::new();
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--click" => clicks.push(args.next()?),
            _ => return None,
        }
    }
    Some(Args { url, clicks })
}

async fn run(args: Args) -> Result<()> {
    let config = RuntimeConfig::from_env();
    let client = Rc::new(ReqwestClient::new(&config)?);
    let page = Runtime::open(&args.url, client, config).await?;
    page.run_page_scripts().await;
    page.settle().await;

    for id in &args.clicks {
        if let Some(target) = page.take_navigation() {
            println!("navigated to {}", target);
            return Ok(());
        }

        let element = page.document().borrow().get_element_by_id(id);
        let Some(element) = element else {
            log::warn!("no element with id {:?}", id);
            continue;
        };
        let disposition = page.process_click(ClickEvent::new(element));
        log::info!("click on #{}: {:?}", id, disposition);
        page.settle().await;
    }

    if let Some(target) = page.take_navigation() {
        println!("navigated to {}", target);
        return Ok(());
    }

    println!("{}", page.document().borrow().to_html());
    Ok(())
}

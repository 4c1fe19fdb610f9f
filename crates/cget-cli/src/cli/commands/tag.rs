//! `cget tag` / `cget forget` – inspect or drop stored tags.

use anyhow::Result;
use cget_core::TagStore;

pub fn run_tag(store: &TagStore, url: &str) {
    match store.get(url) {
        Some(tag) => println!("{}", tag),
        None => println!("No tag stored for {} in {}.", url, store.path().display()),
    }
}

pub fn run_forget(store: &mut TagStore, url: &str) -> Result<()> {
    if store.remove(url).is_some() {
        store.save()?;
        println!("Forgot tag for {} ({}).", url, store.path().display());
    } else {
        println!("No tag stored for {}.", url);
    }
    Ok(())
}

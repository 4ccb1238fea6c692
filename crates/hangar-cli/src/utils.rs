use std::{
    fmt::Display,
    sync::{LazyLock, RwLock},
};

use hangar_conan::{PackageReference, RecipeReference};
use hangar_core::RegistryResult;
use nu_ansi_term::Color;
use serde::Serialize;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn colors_enabled() -> bool {
    COLOR.read().map(|color| *color).unwrap_or(true)
}

pub fn disable_colors() {
    let mut color = COLOR.write().unwrap_or_else(|e| e.into_inner());
    *color = false;
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if colors_enabled() {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

pub fn print_json<T: Serialize>(value: &T) -> RegistryResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Builds a package reference from `id` or `id#revision`.
pub fn package_reference(rref: &RecipeReference, spec: &str) -> RegistryResult<PackageReference> {
    let (reference, revision) = spec.split_once('#').unwrap_or((spec, ""));
    Ok(PackageReference::new(rref.clone(), reference, revision)?)
}

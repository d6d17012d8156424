//! Output formatting for CLI client commands.
//!
//! Human-readable lines by default; `--json` prints the favorite view
//! exactly as the REST layer would serialize it.

use crate::favorite::Favorite;

/// Print a single resolved favorite (or its absence).
pub fn print_favorite(
    name: &str,
    favorite: Option<&Favorite>,
    json: bool,
) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(&favorite)?);
        return Ok(());
    }
    match favorite {
        Some(f) => println!("{}", favorite_line(f)),
        None => println!("{name}: not favoritable"),
    }
    Ok(())
}

/// Print a favorite list as a table.
pub fn print_favorites(favorites: &[Favorite], json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(favorites)?);
        return Ok(());
    }
    if favorites.is_empty() {
        println!("No favorites");
        return Ok(());
    }

    println!("{:<40} {:<12} LINK", "ITEM", "KIND");
    println!("{}", "-".repeat(80));
    for f in favorites {
        println!("{}", favorite_line(f));
    }
    Ok(())
}

/// Print the outcome of a toggle.
pub fn print_toggle(name: &str, favorite: bool, resolved: Option<&Favorite>) {
    let verb = if favorite { "Favorited" } else { "Unfavorited" };
    match resolved {
        Some(f) if f.item.full_name != name => println!("{verb} {name} (as {})", f.item.full_name),
        _ => println!("{verb} {name}"),
    }
}

fn favorite_line(f: &Favorite) -> String {
    let kind = serde_json::to_value(f.item.kind)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default();
    format!("{:<40} {:<12} {}", f.item.full_name, kind, f.link())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorite::{Item, Link, Pipeline, PipelineKind};

    #[test]
    fn favorite_line_columns() {
        let fav = Favorite::of(Pipeline::new(
            &Item::job("main", "repo/main"),
            PipelineKind::Branch,
            Link::new("/p/repo/branches/main/"),
        ));
        let line = favorite_line(&fav);
        assert!(line.starts_with("repo/main "));
        assert!(line.contains(" branch "));
        assert!(line.ends_with("/p/repo/branches/main/favorite/"));
    }
}

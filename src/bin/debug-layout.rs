/// Diagnostic tool to verify sections → squarify → placement pipeline
use squarify_rs::launcher::section::{ShortcutItem, ShortcutSection, ShortcutUsage, Tile};
use squarify_rs::launcher::{self, Launcher};
use squarify_rs::layout::{place, LayoutConfig, Viewport};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("squarify_rs=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let sections_path = args.next().map(PathBuf::from);
    let width: f32 = args.next().map(|s| s.parse::<f32>()).transpose()?.unwrap_or(1280.0);
    let height: f32 = args.next().map(|s| s.parse::<f32>()).transpose()?.unwrap_or(800.0);

    println!("=== DIAGNOSTIC: Sections → Layout → Tiles ===");

    let sections = match &sections_path {
        Some(path) => {
            println!("Loading: {}", path.display());
            launcher::parse_sections(&std::fs::read_to_string(path)?)?
        }
        None => {
            println!("No sections file given, using demo section");
            vec![demo_section()]
        }
    };

    let viewport = Viewport::new(width, height);
    let config = LayoutConfig::default();
    println!(
        "Viewport: {:.0}x{:.0}, min tile side {:.0}px, gap {:.1}px",
        viewport.width, viewport.height, config.min_tile_side, config.gap
    );

    let mut launcher = Launcher::new(sections);
    let ids: Vec<u64> = launcher.sections().iter().map(|s| s.id).collect();

    for id in ids {
        launcher.select_section(id);
        let Some(section) = launcher.current_section() else {
            continue;
        };
        println!(
            "\n[{}] Section '{}' ({} shortcuts)",
            section.id,
            section.name,
            section.items.len()
        );

        let map = launcher.layout(viewport, &config)?;
        if map.is_empty() {
            println!("    (nothing to lay out)");
            continue;
        }

        let root = map.root_extent();
        println!("    Root container: {}x{}", root.edge, root.cross);
        for (row_id, row) in map.rows() {
            let labels: Vec<String> = row
                .nodes
                .iter()
                .map(|t| format!("{}({})", t.label(), t.weight()))
                .collect();
            println!(
                "    row {:>2} {:<10} {:>7.3} x {:<7.3} in {:>7.3} x {:<7.3} {}{}",
                row_id.index(),
                format!("{:?}", row.direction),
                row.edge_length,
                row.cross_edge_length,
                row.container.edge,
                row.container.cross,
                if map.is_rest(row_id) { "REST " } else { "" },
                labels.join(", ")
            );
        }

        let tiles = place(&map, Tile::weight, viewport, &config);
        println!("    Tiles:");
        for tile in &tiles {
            println!(
                "      '{}' at ({:.1}, {:.1}) {:.1}x{:.1}{}",
                tile.item.label(),
                tile.x,
                tile.y,
                tile.w,
                tile.h,
                if tile.is_rest { " [overflow]" } else { "" }
            );
        }

        // Coverage check ignores gaps
        let ungapped = LayoutConfig {
            gap: 0.0,
            ..config.clone()
        };
        let covered: f32 = place(&map, Tile::weight, viewport, &ungapped)
            .iter()
            .map(|t| t.w * t.h)
            .sum();
        println!(
            "    Coverage: {:.1}%",
            covered / viewport.area().max(1.0) * 100.0
        );
    }

    Ok(())
}

fn demo_section() -> ShortcutSection {
    let clicks = [120, 80, 45, 30, 22, 12, 9, 5, 3, 2, 1, 1, 1];
    let items = clicks
        .iter()
        .enumerate()
        .map(|(i, &click_count)| {
            let id = i as u64 + 1;
            ShortcutItem {
                id,
                title: format!("shortcut-{}", id).into(),
                description: String::new(),
                url: format!("https://example.com/{}", id),
                target: Default::default(),
                usages: vec![ShortcutUsage {
                    section_id: 1,
                    item_id: id,
                    click_count,
                }],
            }
        })
        .collect();

    ShortcutSection {
        id: 1,
        name: "Demo".into(),
        items,
    }
}

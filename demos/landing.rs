//! Landing page walkthrough.
//!
//! Builds the fixed section stack of a marketing page (hero, features,
//! showcase, banner grid, call to action) on a simulated scrollable
//! document, then scrolls through it and prints the reveal state after
//! each step.
//!
//! Run with: `cargo run --example landing`

use std::collections::HashMap;

use spark_reveal::{
    Breakpoint, PageHost, Rect, RegionId, RevealableSection, StaggeredCardGrid, card_slots,
    load_banners, scroll::scroll_progress, scroll::subscribe_to_scroll_progress,
};

const BANNERS: &str = r#"[
    {"id": 1, "type": "highlighted", "title": "Lorem Ipsum", "description": "Dolor sit amet", "size": "large"},
    {"id": 2, "type": "basic", "title": "Consectetur", "description": "Adipiscing elit", "size": "medium"},
    {"id": 3, "type": "image", "title": "Sed Do", "description": "Eiusmod tempor", "imageSeed": "tempor", "size": "medium"},
    {"id": 4, "type": "basic", "title": "Incididunt", "description": "Ut labore", "size": "small"},
    {"id": 5, "type": "image", "title": "Et Dolore", "description": "Magna aliqua", "imageSeed": "aliqua", "size": "small"},
    {"id": 6, "type": "highlighted", "title": "Ut Enim", "description": "Ad minim veniam", "size": "large"}
]"#;

fn main() {
    let page = PageHost::new(1280.0, 800.0, 5600.0);
    let host = page.as_host();

    // Fixed section stack, top to bottom
    let section_names = ["hero", "features", "showcase", "banner-grid", "cta"];
    let mut sections: Vec<(&str, RevealableSection, RegionId)> = Vec::new();
    for (i, name) in section_names.iter().enumerate() {
        let region = page.insert_region(Rect::new(0.0, i as f32 * 1000.0, 1280.0, 1000.0));
        let mut section = RevealableSection::new(host.clone());
        section.attach(region);
        sections.push((name, section, region));
    }

    // Banner grid inside the fourth section
    let banners = load_banners(BANNERS).expect("banner document is valid");
    let grid = StaggeredCardGrid::new(host.clone(), card_slots(&banners));
    let grid_region = page.insert_region(Rect::new(0.0, 3100.0, 1280.0, 800.0));
    grid.attach_grid(grid_region);

    // Two columns of cards, large cards spanning both
    let mut card_titles: HashMap<u32, &str> = HashMap::new();
    let mut y = 3150.0;
    for banner in &banners {
        card_titles.insert(banner.id, banner.title.as_str());
        let span = grid.card_span(banner.id, Breakpoint::Wide).unwrap_or(1);
        let width = 300.0 * f32::from(span);
        let region = page.insert_region(Rect::new(100.0, y, width, 220.0));
        grid.attach_card(banner.id, region);
        y += 250.0;
    }

    let unsubscribe = subscribe_to_scroll_progress(host);

    for offset in [0.0, 600.0, 1400.0, 2400.0, 3000.0, 3600.0, 4200.0, 4800.0] {
        page.set_scroll_offset(offset);
        page.run_frame();

        println!("scroll {offset:>6.0}px  progress {:>5.2}", scroll_progress());
        for (name, section, _) in &sections {
            println!("  [{}] {:?}", name, section.phase());
        }
        let active: Vec<&str> = grid
            .active_cards()
            .iter()
            .filter_map(|id| card_titles.get(id).copied())
            .collect();
        println!(
            "  grid gate open: {}, active cards: {:?}",
            grid.gate_is_open(),
            active
        );
    }

    unsubscribe();
}

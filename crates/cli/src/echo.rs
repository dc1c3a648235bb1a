use annonce_core::{ExtractedRecord, Field, ProviderAvailability, StrategyOutcome};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Annonce".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Extract structured real-estate listings\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 1000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 10_000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print which transports are configured
pub fn print_availability(availability: &ProviderAvailability) {
    let flag = |on: bool| if on { "yes".green().to_string() } else { "no".dimmed().to_string() };
    eprintln!("  {} {}", "Rendering:".dimmed(), flag(availability.rendering));
    eprintln!("  {} {}", "Readable:".dimmed(), flag(availability.readable));
    eprintln!("  {} {}", "Crawl:".dimmed(), flag(availability.crawl));
    eprintln!("  {} {}\n", "Direct:".dimmed(), flag(availability.direct));
}

/// Print every strategy attempt
pub fn print_outcomes(outcomes: &[StrategyOutcome]) {
    for outcome in outcomes {
        if outcome.success {
            eprintln!(
                "  {} {} ({} fields)",
                "✓".green(),
                outcome.strategy.name().bright_white(),
                outcome.fields_extracted
            );
        } else {
            eprintln!(
                "  {} {} {}",
                "✗".red(),
                outcome.strategy.name().bright_white(),
                outcome.error.as_deref().unwrap_or_default().dimmed()
            );
        }
    }
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Groups thousands with spaces: `250000` -> `250 000`.
fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Plain-text listing report, one `Label: value` line per known field.
///
/// Derived values are marked with `(estimated)`.
pub fn render_record(record: &ExtractedRecord, fields_extracted: usize, message: Option<&str>) -> String {
    let f = &record.fields;
    let mut lines: Vec<(Field, &str, String)> = Vec::new();
    let mut push = |field: Field, label: &'static str, value: Option<String>| {
        if let Some(value) = value {
            lines.push((field, label, value));
        }
    };

    push(Field::Title, "Title", f.title.clone());
    push(Field::PropertyType, "Type", f.property_type.map(|t| t.to_string()));
    push(Field::Price, "Price", f.price.map(|p| format!("{} €", group_thousands(p))));
    push(Field::Surface, "Surface", f.surface.map(|s| format!("{} m²", s)));
    push(Field::PricePerArea, "Price/m²", f.price_per_area.map(|p| format!("{} €", group_thousands(p))));
    push(Field::Rooms, "Rooms", f.rooms.map(|r| r.to_string()));
    push(Field::Bedrooms, "Bedrooms", f.bedrooms.map(|b| b.to_string()));
    push(Field::Floor, "Floor", f.floor.map(|n| n.to_string()));
    push(Field::EnergyRating, "Energy", f.energy_rating.map(|r| r.as_str().to_string()));
    push(Field::GhgRating, "GHG", f.ghg_rating.map(|r| r.as_str().to_string()));
    push(Field::Address, "Address", f.address.clone());
    push(Field::PostalCode, "Postal code", f.postal_code.clone());
    push(Field::City, "City", f.city.clone());
    push(Field::DepartmentCode, "Department", f.department_code.clone());
    push(Field::MonthlyCharges, "Charges", f.monthly_charges.map(|c| format!("{} €/month", c)));
    push(Field::PropertyTax, "Property tax", f.property_tax.map(|t| format!("{} €/year", group_thousands(t))));
    push(Field::YearBuilt, "Built", f.year_built.map(|y| y.to_string()));
    push(Field::ImageUrl, "Image", f.image_url.clone());

    let amenities: Vec<&str> = [
        (f.elevator, "elevator"),
        (f.outdoor_space, "outdoor space"),
        (f.parking, "parking"),
        (f.cellar, "cellar"),
    ]
    .into_iter()
    .filter_map(|(flag, name)| flag.filter(|on| *on).map(|_| name))
    .collect();

    let width = lines.iter().map(|(_, label, _)| label.len()).max().unwrap_or(0) + 1;
    let mut out = String::new();
    for (field, label, value) in &lines {
        let estimated = record.provenance_of(*field).is_some_and(|p| !p.is_extracted());
        out.push_str(&format!("{:<width$} {}", format!("{}:", label), value, width = width));
        if estimated {
            out.push_str(" (estimated)");
        }
        out.push('\n');
    }
    if !amenities.is_empty() {
        out.push_str(&format!("{:<width$} {}\n", "Amenities:", amenities.join(", "), width = width));
    }
    if let Some(url) = &record.url {
        out.push_str(&format!("{:<width$} {}\n", "URL:", url, width = width));
    }
    out.push_str(&format!("\n{} fields extracted", fields_extracted));
    if let Some(message) = message {
        out.push_str(&format!(" ({})", message));
    }
    out
}

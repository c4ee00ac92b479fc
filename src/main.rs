use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::*;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use return_policy::{
    catalog::{Category, Condition, PaymentMethod, PolicyCatalog, ReturnReason, RuleOrigin},
    cli::{Cli, Commands, PolicyCommands},
    config::Config,
    policy::PolicyDocument,
    returns::{
        Decision, EligibilityChecker, ItemCondition, OrderItem, Payment, RefundEvent,
        RefundScheduler,
    },
    storage::{Database, EvaluationRecord, RefundRecord},
    utils, PolicyError, Result,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("return_policy=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Evaluate {
            category,
            subcategory,
            reasons,
            delivered,
            days_ago,
            today,
            opened,
            used,
            missing_accessories,
            no_tags,
            hygienic_strip_removed,
            format,
        } => {
            let condition = ItemCondition {
                sealed_intact: !opened,
                new_condition: !used,
                accessories_complete: !missing_accessories,
                tags_attached: !no_tags,
                hygienic_strip_intact: !hygienic_strip_removed,
            };
            let request = EvaluateRequest {
                category,
                subcategory,
                reasons,
                delivered,
                days_ago,
                today,
                condition,
            };
            evaluate(&config, request, &format)
        }

        Commands::Refund { payment, event, points, format } => {
            refund(&config, &payment, &event, points, &format)
        }

        Commands::Catalog { category, format } => show_catalog(&config, category.as_deref(), &format),

        Commands::ValidateCatalog { path } => validate_catalog(&path),

        Commands::Policy { command } => policy(command),

        Commands::History { limit, refunds, format } => {
            if refunds {
                show_refund_history(&config, limit, &format)
            } else {
                show_history(&config, limit, &format)
            }
        }

        Commands::Stats { format } => show_stats(&config, &format),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

struct EvaluateRequest {
    category: String,
    subcategory: Option<String>,
    reasons: Vec<String>,
    delivered: Option<NaiveDate>,
    days_ago: Option<u32>,
    today: Option<NaiveDate>,
    condition: ItemCondition,
}

fn evaluate(config: &Config, request: EvaluateRequest, format: &str) -> Result<()> {
    let category: Category = request.category.parse()?;
    let reasons = request
        .reasons
        .iter()
        .map(|r| r.parse::<ReturnReason>())
        .collect::<Result<Vec<_>>>()?;
    let primary = *reasons
        .first()
        .ok_or_else(|| PolicyError::InvalidRequest("at least one --reason is required".to_string()))?;

    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    let delivered_on = delivery_date(request.delivered, request.days_ago, today)?;

    let mut item = OrderItem::new(category, primary, delivered_on).with_condition(request.condition);
    item.subcategory = request.subcategory;

    let checker = EligibilityChecker::new(Arc::new(config.load_catalog()?));
    let decision = if reasons.len() > 1 {
        info!("Evaluating {} candidate reasons", reasons.len());
        checker.evaluate_ambiguous(&item, &reasons, today)?
    } else {
        checker.evaluate_on(&item, today)?
    };

    if config.database.record {
        let db = Database::new(&config.database.path)?;
        let id = db.record_evaluation(&EvaluationRecord::new(&item, &decision))?;
        info!("Recorded evaluation #{}", id);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!("{}", "=== Return Eligibility ===".cyan().bold());
    println!("Category:   {}", category);
    if let Some(sub) = &item.subcategory {
        println!("Subcategory: {}", sub);
    }
    println!("Reason:     {}", decision.return_reason());
    println!("Delivered:  {} ({} days ago)", delivered_on, (today - delivered_on).num_days());
    println!("\n{}", utils::format_decision(&decision));

    for reason in decision.ineligible_reasons() {
        println!("  {} {}", "✗".red(), reason);
    }

    if let Decision::Eligible { rules, .. } = &decision {
        println!("\n{}", "Conditions checked:".yellow());
        for (condition, requirement) in rules.required() {
            println!("  {} {} ({})", "✓".green(), condition, requirement.level);
        }
    }

    Ok(())
}

fn delivery_date(
    delivered: Option<NaiveDate>,
    days_ago: Option<u32>,
    today: NaiveDate,
) -> Result<NaiveDate> {
    match (delivered, days_ago) {
        (Some(date), _) => Ok(date),
        (None, Some(days)) => utils::days_before(today, days),
        (None, None) => Err(PolicyError::InvalidRequest(
            "either --delivered or --days-ago is required".to_string(),
        )),
    }
}

fn refund(
    config: &Config,
    payment: &str,
    event: &str,
    points: Option<u64>,
    format: &str,
) -> Result<()> {
    let method: PaymentMethod = payment.parse()?;
    let event: RefundEvent = event.parse()?;
    let mut payment = Payment::new(method);
    payment.loyalty_points = points;

    let scheduler = RefundScheduler::new(Arc::new(config.load_catalog()?));
    let plan = scheduler.schedule(&payment, event)?;

    if config.database.record {
        let db = Database::new(&config.database.path)?;
        let id = db.record_refund_plan(&RefundRecord::new(&plan))?;
        info!("Recorded refund plan #{}", id);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{}", "=== Refund Plan ===".cyan().bold());
    println!("Paid with:  {}", plan.payment.method);
    println!("Event:      {}", plan.event);
    println!();
    utils::print_table_border(90);
    utils::print_table_row(&["Step", "Portion", "Refund method", "Lead time"], &[5, 18, 30, 35]);
    utils::print_table_border(90);
    for (idx, step) in plan.steps.iter().enumerate() {
        utils::print_table_row(
            &[
                &(idx + 1).to_string(),
                &step.portion.to_string(),
                &step.method.to_string(),
                &step.lead_time.to_string(),
            ],
            &[5, 18, 30, 35],
        );
    }
    utils::print_table_border(90);

    Ok(())
}

fn show_catalog(config: &Config, only: Option<&str>, format: &str) -> Result<()> {
    let catalog = config.load_catalog()?;
    let only: Option<Category> = only.map(str::parse::<Category>).transpose()?;

    let categories: Vec<_> = catalog
        .categories()
        .filter(|(category, _)| only.map_or(true, |c| c == *category))
        .collect();
    if let Some(c) = only {
        catalog.category(c)?;
    }

    if format == "json" {
        let mut out = Vec::new();
        for (category, policy) in &categories {
            let mut rules = serde_json::Map::new();
            for reason in catalog.reasons() {
                if let Some(rule_set) = catalog.lookup(*category, reason)? {
                    rules.insert(reason.to_string(), serde_json::to_value(&rule_set)?);
                }
            }
            out.push(json!({
                "category": category.tag(),
                "window_days": policy.window.days,
                "non_returnable_category": policy.excluded,
                "non_returnable": policy.non_returnable,
                "rules": rules,
            }));
        }
        let refunds: Vec<_> = catalog
            .refund_routes()
            .map(|(payment, route)| json!({ "payment": payment, "route": route }))
            .collect();
        let doc = json!({
            "categories": out,
            "refunds": refunds,
            "loyalty": catalog.loyalty_route(),
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("{}", "=== Return Windows ===".cyan().bold());
    utils::print_table_border(100);
    utils::print_table_row(&["Category", "Window", "Non-returnable"], &[46, 8, 40]);
    utils::print_table_border(100);
    for (category, policy) in &categories {
        let window = format!("{} days", policy.window.days);
        let excluded = if policy.excluded {
            "entire category".to_string()
        } else {
            policy.non_returnable.join(", ")
        };
        utils::print_table_row(&[&category.to_string(), &window, &excluded], &[46, 8, 40]);
    }
    utils::print_table_border(100);

    for (category, _) in &categories {
        println!("\n{}", format!("Conditions: {}", category).yellow());
        let headers: Vec<String> = Condition::BASE
            .iter()
            .chain(std::iter::once(&Condition::HygienicStripIntact))
            .map(|c| utils::truncate(&c.to_string(), 14))
            .collect();
        let mut header_row = vec!["Reason"];
        header_row.extend(headers.iter().map(String::as_str));
        let widths = [26, 14, 14, 14, 14, 14];
        utils::print_table_row(&header_row, &widths);

        for reason in catalog.reasons() {
            let Some(rules) = catalog.lookup(*category, reason)? else {
                continue;
            };
            let cells: Vec<String> = Condition::BASE
                .iter()
                .chain(std::iter::once(&Condition::HygienicStripIntact))
                .map(|c| {
                    let marker = match rules.get(*c).map(|r| r.origin) {
                        Some(RuleOrigin::CategoryOverride) => "*",
                        _ => "",
                    };
                    format!("{}{}", rules.level(*c), marker)
                })
                .collect();
            let reason_label = reason.to_string();
            let mut row = vec![reason_label.as_str()];
            row.extend(cells.iter().map(String::as_str));
            utils::print_table_row(&row, &widths);
        }
    }
    println!("\n(* category-specific rule)");

    println!("\n{}", "=== Refund Routes ===".cyan().bold());
    for (payment, route) in catalog.refund_routes() {
        println!("  {:<18} → {:<30} {}", payment.to_string(), route.method.to_string(), route.lead_time);
    }
    let loyalty = catalog.loyalty_route();
    println!(
        "  {:<18} → {:<30} {}",
        PaymentMethod::LoyaltyPoints.to_string(),
        loyalty.method.to_string(),
        loyalty.lead_time
    );

    Ok(())
}

fn validate_catalog(path: &str) -> Result<()> {
    let catalog = PolicyCatalog::load(path)?;
    println!("{} {}", "✓".green(), format!("{} is a valid catalog", path).green());
    println!("  Categories:    {}", catalog.categories().count());
    println!("  Reasons:       {}", catalog.reasons().count());
    println!("  Refund routes: {}", catalog.refund_routes().count() + 1);
    Ok(())
}

fn policy(command: PolicyCommands) -> Result<()> {
    let doc = PolicyDocument::builtin();

    match command {
        PolicyCommands::Show => {
            println!("{}", doc.markdown());
        }

        PolicyCommands::Sections { levels } => {
            for heading in doc.sections(levels) {
                let indent = "  ".repeat(heading.level.saturating_sub(1));
                println!("{}{} {}", indent, heading.title, format!("#{}", heading.anchor).dimmed());
            }
        }

        PolicyCommands::Section { title_or_anchor } => {
            let section = doc.section(&title_or_anchor)?;
            print!("{}", section.markdown);
        }

        PolicyCommands::Search { query, max_results, context, format } => {
            let hits = doc.search(&query, max_results, context)?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&json!({ "query": query.trim(), "results": hits }))?);
                return Ok(());
            }

            if hits.is_empty() {
                println!("{}", format!("No matches for '{}'", query).yellow());
            }
            for hit in hits {
                let section = hit
                    .section
                    .as_ref()
                    .map(|s| s.title.as_str())
                    .unwrap_or("(top)");
                println!("{} line {} in {}", "▸".cyan(), hit.line + 1, section.bold());
                println!("  {}", hit.snippet.replace('\n', " "));
            }
        }
    }

    Ok(())
}

fn show_history(config: &Config, limit: usize, format: &str) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let records = db.recent_evaluations(Some(limit))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No evaluations recorded".yellow());
        return Ok(());
    }

    utils::print_table_border(110);
    utils::print_table_row(
        &["Evaluated", "Category", "Reason", "Delivered", "Decision"],
        &[24, 18, 24, 12, 24],
    );
    utils::print_table_border(110);
    for record in &records {
        let verdict = if record.eligible { "Eligible".green() } else { "Ineligible".red() };
        utils::print_table_row(
            &[
                &utils::format_timestamp(&record.evaluated_at),
                &record.category,
                &record.reason,
                &record.delivered_on.to_string(),
                &verdict.to_string(),
            ],
            &[24, 18, 24, 12, 24],
        );
    }
    utils::print_table_border(110);

    Ok(())
}

fn show_refund_history(config: &Config, limit: usize, format: &str) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let records = db.recent_refund_plans(Some(limit))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No refund plans recorded".yellow());
        return Ok(());
    }

    utils::print_table_border(100);
    utils::print_table_row(&["Created", "Paid with", "Event", "Refund"], &[24, 18, 16, 36]);
    utils::print_table_border(100);
    for record in &records {
        let refund = record
            .plan
            .steps
            .iter()
            .map(|step| step.method.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        utils::print_table_row(
            &[
                &utils::format_timestamp(&record.created_at),
                &record.payment_method,
                &record.event,
                &utils::truncate(&refund, 36),
            ],
            &[24, 18, 16, 36],
        );
    }
    utils::print_table_border(100);

    Ok(())
}

fn show_stats(config: &Config, format: &str) -> Result<()> {
    let db = Database::new(&config.database.path)?;
    let stats = db.get_stats()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Return Decision Statistics ===".cyan().bold());
    println!("\nEvaluations:");
    println!("  Total:      {}", stats.total_evaluations);
    println!("  Eligible:   {}", stats.eligible.to_string().green());
    println!("  Ineligible: {}", stats.ineligible.to_string().red());

    println!("\nRefund plans:");
    println!("  Total:      {}", stats.refund_plans);
    println!("  Split:      {}", stats.split_refunds.to_string().yellow());

    Ok(())
}

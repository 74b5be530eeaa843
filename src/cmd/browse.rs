//! Interactive records manager — `userbook browse`.

use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use tracing::warn;
use userbook::client::{
    ControlId, Control, Form, FormKey, HttpTransport, Outcome, Page, RecordFormController,
};
use userbook::config::ClientSection;
use userbook_common::Field;

const MENU: &[&str] = &[
    "Add a record",
    "Edit a record",
    "Remove a record",
    "Load more",
    "Quit",
];

pub async fn cmd_browse(config: &ClientSection) -> Result<()> {
    let transport = HttpTransport::new(&config.base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let controller = RecordFormController::bootstrap(Arc::new(transport), config.page_size)
        .await
        .with_context(|| format!("Failed to load records from {}", config.base_url))?;

    let theme = ColorfulTheme::default();
    loop {
        println!();
        for line in controller.view(render_page) {
            println!("{}", line);
        }
        println!();

        let selection = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(MENU)
            .default(0)
            .interact()?;

        let outcome = match selection {
            0 => {
                prompt_fields(&controller, &theme, None)?;
                controller.click(ControlId::Add).await
            }
            1 => match pick_record(&controller, &theme, "Edit which record?")? {
                Some(key) => {
                    prompt_fields(&controller, &theme, Some(key))?;
                    controller.click(ControlId::Update(key)).await
                }
                None => continue,
            },
            2 => match pick_record(&controller, &theme, "Remove which record?")? {
                Some(key) => {
                    let confirmed = Confirm::with_theme(&theme)
                        .with_prompt("Remove this record?")
                        .default(false)
                        .interact()?;
                    if !confirmed {
                        continue;
                    }
                    controller.click(ControlId::Remove(key)).await
                }
                None => continue,
            },
            3 => controller.click(ControlId::More).await,
            _ => break,
        };

        if let Outcome::Failed(e) = &outcome {
            warn!(error = %e, "request failed");
        }
        println!("  {}", describe_outcome(&outcome));
    }
    Ok(())
}

/// Ask for every visible input of the addressed form, pre-filled with its
/// current value. `None` addresses the creation form.
fn prompt_fields(
    controller: &RecordFormController,
    theme: &ColorfulTheme,
    key: Option<FormKey>,
) -> Result<()> {
    let fields: Vec<(Field, String)> = controller.view(|page| {
        form_of(page, key)
            .map(|form| {
                form.inputs
                    .iter()
                    .filter(|i| !i.is_hidden())
                    .map(|i| (i.name, i.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    });

    for (field, current) in fields {
        let value = Input::<String>::with_theme(theme)
            .with_prompt(field.placeholder().unwrap_or(field.label()))
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()?;
        controller.edit(|page| {
            if let Some(form) = form_of_mut(page, key) {
                form.set_value(field, &value);
            }
        });
    }
    Ok(())
}

fn pick_record(
    controller: &RecordFormController,
    theme: &ColorfulTheme,
    prompt: &str,
) -> Result<Option<FormKey>> {
    let entries: Vec<(FormKey, String)> = controller.view(|page| {
        page.list
            .iter()
            .map(|(key, form)| (key, record_summary(form)))
            .collect()
    });
    if entries.is_empty() {
        println!("  {}", style("No records loaded.").dim());
        return Ok(None);
    }
    let labels: Vec<&str> = entries.iter().map(|(_, label)| label.as_str()).collect();
    let index = Select::with_theme(theme)
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(index.map(|i| entries[i].0))
}

fn form_of(page: &Page, key: Option<FormKey>) -> Option<&Form> {
    match key {
        None => Some(&page.add_form),
        Some(key) => page.list.get(key),
    }
}

fn form_of_mut(page: &mut Page, key: Option<FormKey>) -> Option<&mut Form> {
    match key {
        None => Some(&mut page.add_form),
        Some(key) => page.list.get_mut(key),
    }
}

fn record_summary(form: &Form) -> String {
    format!(
        "#{:<5} {} {}  {}  {}",
        form.value(Field::Id),
        form.value(Field::FirstName),
        form.value(Field::LastName),
        form.value(Field::Dob),
        form.value(Field::ZipCode),
    )
}

/// Whether the last rejected submission flagged `field`.
fn is_flagged(form: &Form, field: Field) -> bool {
    form.violations.iter().any(|v| v.field() == field)
}

fn render_control(control: &Control) -> String {
    let mut out = format!("[{}]", control.label);
    if control.failed {
        out = format!("{} {}", style(out).red(), style("failed").red().bold());
    } else if control.disabled {
        out = format!("{} {}", style(out).dim(), style("busy").dim());
    } else {
        out = style(out).cyan().to_string();
    }
    out
}

fn render_violations(form: &Form, lines: &mut Vec<String>) {
    for violation in &form.violations {
        lines.push(format!("      {}", style(violation).yellow()));
    }
}

/// Text rendering of the page, one line per row.
pub fn render_page(page: &Page) -> Vec<String> {
    let mut lines = vec![style("Users").bold().cyan().to_string()];

    if page.list.is_empty() {
        lines.push(format!("  {}", style("(no records)").dim()));
    }
    for (_, form) in page.list.iter() {
        let controls: Vec<String> = form.controls.iter().map(render_control).collect();
        lines.push(format!("  {}  {}", record_summary(form), controls.join(" ")));
        render_violations(form, &mut lines);
    }
    lines.push(format!("  {}", render_control(&page.more)));

    let draft: Vec<String> = page
        .add_form
        .inputs
        .iter()
        .filter(|i| !i.is_hidden())
        .map(|i| {
            let cell = format!("{}={}", i.name, i.value);
            if is_flagged(&page.add_form, i.name) {
                format!("{}{}", style("!").red().bold(), style(cell).red())
            } else {
                cell
            }
        })
        .collect();
    let add_controls: Vec<String> = page.add_form.controls.iter().map(render_control).collect();
    lines.push(format!(
        "  {} {}  {}",
        style("New:").bold(),
        draft.join(" "),
        add_controls.join(" ")
    ));
    render_violations(&page.add_form, &mut lines);
    lines
}

pub fn describe_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Ignored => style("Nothing to do.").dim().to_string(),
        Outcome::Invalid(violations) => format!(
            "{} {} field(s) need attention",
            style("Not sent:").yellow().bold(),
            violations.len()
        ),
        Outcome::Succeeded => style("Done.").green().to_string(),
        Outcome::Loaded { appended } => {
            format!("{} {} record(s)", style("Loaded").green(), appended)
        }
        Outcome::Failed(e) => format!("{} {}", style("Failed:").red().bold(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use userbook::errors::ClientError;
    use userbook_common::Record;

    fn plain(lines: Vec<String>) -> Vec<String> {
        lines
            .iter()
            .map(|l| console::strip_ansi_codes(l).to_string())
            .collect()
    }

    #[test]
    fn render_lists_records_and_controls() {
        let page = Page::new(&[Record::new(7_i64, "Ann", "Lee", "1990-01-02", "12345")]);
        let lines = plain(render_page(&page));
        assert!(lines[1].contains("#7"));
        assert!(lines[1].contains("Ann Lee"));
        assert!(lines[1].contains("[Update]"));
        assert!(lines[1].contains("[Remove]"));
        assert!(lines.iter().any(|l| l.contains("[More]")));
    }

    #[test]
    fn render_marks_failed_and_busy_controls() {
        let mut page = Page::new(&[]);
        page.more.failed = true;
        if let Some(add) = page.control_mut(ControlId::Add) {
            add.disabled = true;
        }
        let lines = plain(render_page(&page));
        assert!(lines.iter().any(|l| l.contains("(no records)")));
        assert!(lines.iter().any(|l| l.contains("[More] failed")));
        assert!(lines.iter().any(|l| l.contains("busy")));
    }

    #[test]
    fn render_flags_rejected_draft_inputs() {
        let mut page = Page::new(&[]);
        page.add_form.set_value(Field::FirstName, "Ann");
        page.add_form.set_value(Field::Dob, "1990-01-02");
        page.add_form.set_value(Field::ZipCode, "12");
        page.add_form.violations = page.add_form.check_validity();
        let lines = plain(render_page(&page));
        let draft = lines.iter().find(|l| l.contains("New:")).unwrap();
        assert!(draft.contains("!zipcode=12"));
        assert!(draft.contains("!lastname="));
        assert!(draft.contains(" firstname=Ann"));
        assert!(!draft.contains("!dob="));
        assert!(lines.iter().any(|l| l.contains("Zip Code must look like")));
    }

    #[test]
    fn describe_outcomes() {
        let text = |o: &Outcome| console::strip_ansi_codes(&describe_outcome(o)).to_string();
        assert_eq!(text(&Outcome::Loaded { appended: 3 }), "Loaded 3 record(s)");
        assert!(text(&Outcome::Failed(ClientError::Status { status: 400 })).contains("400"));
    }
}

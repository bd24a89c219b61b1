use sales_forecaster::forecasting::schema::{CATEGORY_CHOICES, SIZE_CHOICES};
use sales_forecaster::forecasting::{
    DemandTier, FeatureRecord, Forecast, PredictionFailure, RawInput,
};

pub(crate) const PAGE_TITLE: &str = "Amazon Sales Forecaster";

pub(crate) enum PageOutcome<'a> {
    Forecast(&'a Forecast),
    Failure(&'a PredictionFailure),
}

fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

/// Renders the form pre-filled with `values`, followed by the outcome of the last submission.
pub(crate) fn render_page(values: &RawInput, outcome: Option<PageOutcome<'_>>) -> String {
    let mut html = String::new();

    html.push_str(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    html.push_str(&format!("  <title>{PAGE_TITLE}</title>\n"));
    html.push_str(
        "  <style>\n    body { font-family: ui-sans-serif, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 24px auto; max-width: 760px; color: #1f2430; }\n    form { display: grid; grid-template-columns: 1fr 1fr; gap: 12px 24px; }\n    label { display: flex; flex-direction: column; font-size: 14px; gap: 4px; }\n    button { grid-column: span 2; padding: 10px; background: #ff4b4b; color: #fff; border: 0; border-radius: 6px; font-size: 15px; }\n    .notice { padding: 12px; border-radius: 6px; margin-top: 12px; }\n    .high { background: #dff5e3; }\n    .moderate { background: #e3eefc; }\n    .low { background: #fff4d6; }\n    .error { background: #fde2e2; }\n    table { border-collapse: collapse; margin-top: 12px; font-size: 13px; }\n    td, th { border: 1px solid #d5d9e2; padding: 4px 8px; text-align: left; }\n  </style>\n</head>\n<body>\n",
    );

    html.push_str("<h1>Amazon Demand Forecasting System</h1>\n");
    html.push_str("<p>Enter product details below to predict daily sales volume.</p>\n");
    html.push_str(&render_form(values, outcome.is_some()));

    match outcome {
        Some(PageOutcome::Forecast(forecast)) => html.push_str(&render_forecast(forecast)),
        Some(PageOutcome::Failure(failure)) => html.push_str(&render_failure(failure)),
        None => {}
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// A submitted form echoes the scored price as posted; a blank form shows it to cents.
fn render_form(values: &RawInput, submitted: bool) -> String {
    let mut html = String::new();
    html.push_str("<form method=\"post\" action=\"/forecast\">\n");
    html.push_str(&format!(
        "<label>Select Date<input type=\"date\" name=\"date\" value=\"{}\" required></label>\n",
        values.date.format("%Y-%m-%d")
    ));
    html.push_str(&format!(
        "<label>Current Stock Level<input type=\"number\" name=\"stock_level\" min=\"0\" step=\"1\" value=\"{}\" required></label>\n",
        values.stock_level
    ));
    html.push_str(&render_select(
        "Product Category",
        "category",
        CATEGORY_CHOICES,
        &values.category,
    ));
    let price = if submitted {
        values.price.to_string()
    } else {
        format!("{:.2}", values.price)
    };
    html.push_str(&format!(
        "<label>Selling Price (RATE)<input type=\"number\" name=\"price\" min=\"0\" step=\"0.01\" value=\"{price}\" required></label>\n"
    ));
    html.push_str(&render_select("Size", "size", SIZE_CHOICES, &values.size));
    html.push_str("<button type=\"submit\">Generate Forecast</button>\n</form>\n");
    html
}

fn render_select(label: &str, name: &str, choices: &[&str], selected: &str) -> String {
    let mut html = format!("<label>{label}<select name=\"{name}\">\n");

    // Keep a value posted outside the offered choices so the form echoes what was scored.
    let extra = (!choices.contains(&selected)).then_some(selected);
    for choice in extra.into_iter().chain(choices.iter().copied()) {
        let marker = if choice == selected { " selected" } else { "" };
        let escaped = html_escape(choice);
        html.push_str(&format!(
            "  <option value=\"{escaped}\"{marker}>{escaped}</option>\n"
        ));
    }

    html.push_str("</select></label>\n");
    html
}

fn render_forecast(forecast: &Forecast) -> String {
    let class_name = match forecast.tier {
        DemandTier::High => "high",
        DemandTier::Moderate => "moderate",
        DemandTier::Low => "low",
    };

    format!(
        "<hr>\n<section id=\"result\">\n<h2>Predicted Sales: {} Units</h2>\n<div class=\"notice {class_name}\">{}</div>\n</section>\n",
        forecast.display(),
        html_escape(forecast.tier.message())
    )
}

fn render_failure(failure: &PredictionFailure) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<hr>\n<section id=\"result\">\n<div class=\"notice error\">Error making prediction: {}</div>\n",
        html_escape(&failure.message)
    ));
    html.push_str("<p>Debug - Input Data:</p>\n");
    html.push_str(&render_record(&failure.record));
    html.push_str("</section>\n");
    html
}

fn render_record(record: &FeatureRecord) -> String {
    let mut html = String::from("<table>\n<tr>");
    for column in record.columns() {
        html.push_str(&format!("<th>{}</th>", html_escape(column)));
    }
    html.push_str("</tr>\n<tr>");
    for value in record.values() {
        html.push_str(&format!("<td>{value}</td>"));
    }
    html.push_str("</tr>\n</table>\n");
    html
}

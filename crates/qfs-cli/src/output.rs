use serde_json::Value;

fn marker(severity: &str) -> &'static str {
    match severity {
        "error" => "✗",
        "warning" => "!",
        _ => "✓",
    }
}

fn yes_no(v: &Value) -> &'static str {
    if v.as_bool().unwrap_or(false) {
        "yes"
    } else {
        "no"
    }
}

pub fn print_alerts(alerts: &Value) {
    let Some(alerts) = alerts.as_array() else {
        return;
    };
    for a in alerts {
        let severity = a["severity"].as_str().unwrap_or("info");
        println!(
            "{} {}",
            marker(severity),
            a["summary"].as_str().unwrap_or("")
        );
        for line in a["detail"].as_str().unwrap_or("").lines() {
            println!("    {}", line);
        }
    }
}

pub fn print_shared_page(page: &Value) {
    println!("\n=== {} ===\n", page["title"].as_str().unwrap_or(""));
    print_alerts(&page["alerts"]);

    let rows = page["table"]["rows"].as_array().cloned().unwrap_or_default();
    let actions = page["row_actions"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("  (No members)");
    } else {
        println!(
            "  {:<20} {:<28} {:<12} {:<10}",
            "Host", "Role", "Status", "Actions"
        );
        println!("  {:-<75}", "");
        for (i, row) in rows.iter().enumerate() {
            let mut enabled = Vec::new();
            if let Some(a) = actions.get(i) {
                for name in ["mount", "unmount", "remove"] {
                    if a[name].as_bool().unwrap_or(false) {
                        enabled.push(name);
                    }
                }
            }
            println!(
                "  {:<20} {:<28} {:<12} {:<10}",
                row["host_name"].as_str().unwrap_or(""),
                row["role"].as_str().unwrap_or(""),
                row["mount_state"].as_str().unwrap_or(""),
                if enabled.is_empty() { "-".to_string() } else { enabled.join(",") },
            );
        }
    }

    let status = &page["status"];
    println!();
    println!(
        "  Metadata server: {}",
        status["metadata_server"].as_str().unwrap_or("N/A")
    );
    println!("  All mounted:     {}", yes_no(&status["all_mounted"]));
    println!(
        "  Clients mounted: {}",
        yes_no(&status["all_clients_mounted"])
    );
    println!();
}

pub fn print_file_systems(summary: &Value) {
    println!(
        "\n=== {} ===\n",
        summary["table"]["title"].as_str().unwrap_or("File Systems")
    );
    print_alerts(&summary["alerts"]);
    let rows = summary["table"]["rows"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        println!("No file systems found.");
        return;
    }
    println!(
        "{:<20} {:<30} {:<8} {:<10}",
        "Name", "Mount Point", "Shared", "Status"
    );
    println!("{:-<70}", "");
    for row in rows {
        println!(
            "{:<20} {:<30} {:<8} {:<10}",
            row["name"].as_str().unwrap_or(""),
            row["mount_point"].as_str().unwrap_or(""),
            yes_no(&row["shared"]),
            row["mount_state"].as_str().unwrap_or(""),
        );
    }
    println!();
}

pub fn print_browse(page: &Value) {
    println!("\n=== Browse ===\n");
    println!("  Host:        {}", page["host"].as_str().unwrap_or(""));
    println!("  Path:        {}", page["path"].as_str().unwrap_or(""));
    match page.get("file_system").filter(|v| !v.is_null()) {
        Some(fs) => {
            println!("  File system: {}", fs["fs_name"].as_str().unwrap_or(""));
            println!("  Mount point: {}", fs["mount_point"].as_str().unwrap_or(""));
            println!("  Mounted:     {}", yes_no(&page["mounted"]));
        }
        None => println!("  File system: (none)"),
    }
    print_alerts(&page["alerts"]);
    println!();
}

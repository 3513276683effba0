//! Composite tools: one client-list call fanned out into per-client
//! detail calls, batched 10 at a time to respect upstream rate limits.
//!
//! Result payloads always report both the unfiltered total and the
//! count remaining after filters.

use chrono::{DateTime, Duration, Utc};
use concierge_domain::{ToolCall, ToolResult};
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::warn;

use crate::upstream::UpstreamGateway;

/// Per-item fetches run in groups of this size, awaited group by group.
const BATCH_SIZE: usize = 10;

fn arg_str(call: &ToolCall, key: &str) -> Option<Value> {
    call.arguments.get(key).cloned()
}

fn arg_u64(call: &ToolCall, key: &str) -> Option<u64> {
    call.arguments.get(key).and_then(Value::as_u64)
}

fn arg_bool(call: &ToolCall, key: &str, default: bool) -> bool {
    call.arguments
        .get(key)
        .and_then(Value::as_bool)
        .unwrap_or(default)
}

fn client_id_of(client: &Value) -> String {
    match client.get("Id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Keep a client when its visit count falls inside the requested bounds.
fn passes_visit_bounds(count: usize, min: Option<u64>, max: Option<u64>) -> bool {
    if let Some(min) = min {
        if (count as u64) < min {
            return false;
        }
    }
    if let Some(max) = max {
        if (count as u64) > max {
            return false;
        }
    }
    true
}

fn visit_summary(total: usize, matching: usize) -> String {
    if total == 0 {
        "No clients found matching the criteria.".to_string()
    } else {
        format!("Found {matching} clients matching criteria out of {total} total.")
    }
}

/// Clients plus their visit history in one call.
pub(crate) async fn clients_with_visits(
    gateway: &UpstreamGateway,
    call: &ToolCall,
) -> ToolResult {
    let name = &call.tool_name;
    let limit = arg_u64(call, "limit").unwrap_or(100);

    let mut client_query = vec![
        ("IncludeInactive".to_string(), json!(arg_bool(call, "include_inactive", false))),
        ("Limit".to_string(), json!(limit)),
        ("Offset".to_string(), json!(0)),
    ];
    if let Some(text) = arg_str(call, "search_text") {
        client_query.push(("SearchText".to_string(), text));
    }
    if let Some(ids) = arg_str(call, "client_ids") {
        client_query.push(("ClientIds".to_string(), ids));
    }
    if let Some(date) = arg_str(call, "last_modified_date") {
        client_query.push(("LastModifiedDate".to_string(), date));
    }

    let response = match gateway.get("/client/clients", &client_query).await {
        Ok(payload) => payload,
        Err(e) => return ToolResult::failure(name, e.into_tool_error()),
    };
    let clients: Vec<Value> = response
        .get("Clients")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if clients.is_empty() {
        let payload = json!({
            "total_clients_found": 0,
            "clients_matching_criteria": 0,
            "summary": visit_summary(0, 0),
            "clients": [],
        });
        return ToolResult::success(name, payload.to_string());
    }

    let mut visit_query = vec![
        ("Limit".to_string(), json!(200)),
        ("Offset".to_string(), json!(0)),
    ];
    if let Some(date) = arg_str(call, "visit_start_date") {
        visit_query.push(("StartDate".to_string(), date));
    }
    if let Some(date) = arg_str(call, "visit_end_date") {
        visit_query.push(("EndDate".to_string(), date));
    }

    let mut records = Vec::with_capacity(clients.len());
    for batch in clients.chunks(BATCH_SIZE) {
        let fetches = batch.iter().map(|client| {
            let mut query = visit_query.clone();
            let id = client_id_of(client);
            query.push(("ClientId".to_string(), json!(id.clone())));
            async move {
                let visits = match gateway.get("/client/clientvisits", &query).await {
                    Ok(payload) => payload
                        .get("Visits")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default(),
                    Err(e) => {
                        warn!("Visit fetch failed for client {id}: {e}");
                        return json!({
                            "client_id": id,
                            "first_name": client.get("FirstName"),
                            "last_name": client.get("LastName"),
                            "visit_count": 0,
                            "visits": [],
                            "error": "Failed to fetch visits",
                        });
                    }
                };
                json!({
                    "client_id": id,
                    "first_name": client.get("FirstName"),
                    "last_name": client.get("LastName"),
                    "visit_count": visits.len(),
                    "visits": visits.iter().take(10).collect::<Vec<_>>(),
                    "first_visit_date": visits.last().and_then(|v| v.get("StartDateTime")),
                    "last_visit_date": visits.first().and_then(|v| v.get("StartDateTime")),
                })
            }
        });
        records.extend(join_all(fetches).await);
    }

    let min_visits = arg_u64(call, "min_visits");
    let max_visits = arg_u64(call, "max_visits");
    let matching: Vec<&Value> = records
        .iter()
        .filter(|r| {
            let count = r
                .get("visit_count")
                .and_then(Value::as_u64)
                .unwrap_or(0) as usize;
            passes_visit_bounds(count, min_visits, max_visits)
        })
        .collect();

    let payload = json!({
        "total_clients_found": records.len(),
        "clients_matching_criteria": matching.len(),
        "summary": visit_summary(records.len(), matching.len()),
        "clients": matching,
    });
    ToolResult::success(name, payload.to_string())
}

/// Conversion outlook for a lapsed non-member, from their visit pattern.
fn conversion_assessment(
    is_new_client: bool,
    days_since_visit: i64,
    total_visits: usize,
    services_tried: usize,
) -> (&'static str, String) {
    let (mut potential, mut action) = if is_new_client && (3..=7).contains(&days_since_visit) {
        (
            "high",
            format!(
                "Hot lead: new client visited {days_since_visit} days ago. \
                 Reach out with an intro membership offer."
            ),
        )
    } else if is_new_client {
        (
            "medium",
            format!(
                "Follow up needed: new client has not returned in {days_since_visit} \
                 days. Send a check-in message with a return incentive."
            ),
        )
    } else if total_visits > 2 {
        (
            "medium",
            format!(
                "Repeat visitor ({total_visits} visits) not yet a member. Present \
                 the membership value against per-visit pricing."
            ),
        )
    } else {
        (
            "low",
            format!("Add to nurture sequence. {days_since_visit} days since last visit."),
        )
    };

    if services_tried >= 2 && potential != "high" {
        potential = "high";
        action = format!(
            "Engaged client: tried {services_tried} different services. Strong \
             candidate for an unlimited membership pitch."
        );
    }
    (potential, action)
}

async fn analyze_trial_candidate(
    gateway: &UpstreamGateway,
    client: &Value,
    now: DateTime<Utc>,
    window_start: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    check_bookings: bool,
) -> Option<Value> {
    let id = client_id_of(client);

    let memberships = gateway
        .get(
            "/client/activeclientmemberships",
            &[
                ("ClientId".to_string(), json!(id.clone())),
                ("Limit".to_string(), json!(10)),
                ("Offset".to_string(), json!(0)),
            ],
        )
        .await
        .ok()?;
    let active = memberships
        .get("ClientMemberships")
        .and_then(Value::as_array)
        .map(|m| !m.is_empty())
        .unwrap_or(false);
    if active {
        return None;
    }

    let recent = gateway
        .get(
            "/client/clientvisits",
            &[
                ("ClientId".to_string(), json!(id.clone())),
                ("StartDate".to_string(), json!(window_start.to_rfc3339())),
                ("Limit".to_string(), json!(50)),
                ("Offset".to_string(), json!(0)),
            ],
        )
        .await
        .ok()?;
    let mut visits: Vec<Value> = recent
        .get("Visits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if visits.is_empty() {
        return None;
    }
    // Newest first
    visits.sort_by(|a, b| {
        let time = |v: &Value| {
            v.get("StartDateTime")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        };
        time(b).cmp(&time(a))
    });

    let last_visit = visits
        .first()
        .and_then(|v| v.get("StartDateTime"))
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))?;
    if last_visit > cutoff {
        return None;
    }
    let days_since_visit = (now - last_visit).num_days();

    if check_bookings {
        let schedule = gateway
            .get(
                "/client/clientschedule",
                &[
                    ("ClientId".to_string(), json!(id.clone())),
                    ("StartDate".to_string(), json!(now.to_rfc3339())),
                    (
                        "EndDate".to_string(),
                        json!((now + Duration::days(30)).to_rfc3339()),
                    ),
                    ("Limit".to_string(), json!(10)),
                    ("Offset".to_string(), json!(0)),
                ],
            )
            .await
            .ok()?;
        let booked = ["Appointments", "Classes"].iter().any(|key| {
            schedule
                .get(*key)
                .and_then(Value::as_array)
                .map(|a| !a.is_empty())
                .unwrap_or(false)
        });
        if booked {
            return None;
        }
    }

    let all_time = gateway
        .get(
            "/client/clientvisits",
            &[
                ("ClientId".to_string(), json!(id.clone())),
                ("Limit".to_string(), json!(100)),
                ("Offset".to_string(), json!(0)),
            ],
        )
        .await
        .ok()?;
    let total_visits = all_time
        .get("Visits")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    let is_new_client = total_visits <= 2;

    let services_used: Vec<Value> = visits
        .iter()
        .take(5)
        .map(|v| {
            json!({
                "name": v.get("Name").or_else(|| v.get("ServiceName")).cloned()
                    .unwrap_or_else(|| json!("Unknown Service")),
                "date": v.get("StartDateTime"),
            })
        })
        .collect();

    let (potential, action) =
        conversion_assessment(is_new_client, days_since_visit, total_visits, services_used.len());

    Some(json!({
        "client_id": id,
        "first_name": client.get("FirstName"),
        "last_name": client.get("LastName"),
        "email": client.get("Email"),
        "phone": client.get("MobilePhone").or_else(|| client.get("HomePhone")),
        "created_date": client.get("CreationDate"),
        "last_visit_date": last_visit.to_rfc3339(),
        "days_since_visit": days_since_visit,
        "services_used": services_used,
        "visit_count": total_visits,
        "is_new_client": is_new_client,
        "conversion_potential": potential,
        "recommended_action": action,
    }))
}

/// Non-member clients who visited recently and have not returned.
pub(crate) async fn non_member_trial_clients(
    gateway: &UpstreamGateway,
    call: &ToolCall,
) -> ToolResult {
    let name = &call.tool_name;
    let recent_window_days = arg_u64(call, "recent_window_days").unwrap_or(14) as i64;
    let min_days_since_visit = arg_u64(call, "min_days_since_visit").unwrap_or(3) as i64;
    let check_bookings = arg_bool(call, "include_upcoming_bookings", true);
    let limit = arg_u64(call, "limit").unwrap_or(100);

    let now = Utc::now();
    let window_start = now - Duration::days(recent_window_days);
    let cutoff = now - Duration::days(min_days_since_visit);

    let response = gateway
        .get(
            "/client/clients",
            &[
                (
                    "LastModifiedDate".to_string(),
                    json!(window_start.to_rfc3339()),
                ),
                ("IncludeInactive".to_string(), json!(false)),
                ("Limit".to_string(), json!(limit)),
                ("Offset".to_string(), json!(0)),
            ],
        )
        .await;
    let response = match response {
        Ok(payload) => payload,
        Err(e) => return ToolResult::failure(name, e.into_tool_error()),
    };
    let clients: Vec<Value> = response
        .get("Clients")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if clients.is_empty() {
        let payload = json!({
            "total_analyzed": 0,
            "trial_clients_found": 0,
            "summary": "No recent clients found to analyze.",
            "non_member_trials": [],
        });
        return ToolResult::success(name, payload.to_string());
    }

    let mut trials = Vec::new();
    for batch in clients.chunks(BATCH_SIZE) {
        let analyses = batch.iter().map(|client| {
            analyze_trial_candidate(gateway, client, now, window_start, cutoff, check_bookings)
        });
        trials.extend(join_all(analyses).await.into_iter().flatten());
    }

    let payload = json!({
        "total_analyzed": clients.len(),
        "trial_clients_found": trials.len(),
        "summary": format!(
            "Analyzed {} recent clients; {} are lapsed non-members worth a follow-up.",
            clients.len(),
            trials.len()
        ),
        "non_member_trials": trials,
    });
    ToolResult::success(name, payload.to_string())
}

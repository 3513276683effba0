//! The fixed tool catalog.
//!
//! Nineteen single-endpoint tools plus two composites. Each
//! single-endpoint tool is a schema over one upstream GET; the wire key
//! for each parameter is its PascalCase form (`client_id` → `ClientId`).

use concierge_domain::{ToolDefinition, ToolParameter, ToolSpec};
use std::collections::HashMap;

pub const CLIENTS_WITH_VISITS: &str = "get_clients_with_visits";
pub const NON_MEMBER_TRIAL_CLIENTS: &str = "get_non_member_trial_clients";

/// A single-endpoint tool: its schema and the upstream path it hits.
pub struct CatalogEntry {
    pub definition: ToolDefinition,
    pub endpoint: &'static str,
}

fn opt(name: &str, description: &str) -> ToolParameter {
    ToolParameter::new(name, description, false)
}

fn opt_typed(name: &str, description: &str, param_type: &str) -> ToolParameter {
    ToolParameter::new(name, description, false).with_type(param_type)
}

fn client_id() -> ToolParameter {
    ToolParameter::new(
        "client_id",
        "The client's unique ID. Call get_clients first to obtain it.",
        true,
    )
}

fn paging() -> [ToolParameter; 2] {
    [
        opt_typed("limit", "Maximum number of results (default 100)", "number"),
        opt_typed("offset", "Pagination offset (default 0)", "number"),
    ]
}

fn entry(definition: ToolDefinition, endpoint: &'static str) -> CatalogEntry {
    CatalogEntry {
        definition,
        endpoint,
    }
}

/// Build the nineteen single-endpoint tools.
pub fn standard_entries() -> Vec<CatalogEntry> {
    let [limit, offset] = paging();
    let mut entries = Vec::new();

    entries.push(entry(
        ToolDefinition::new(
            "get_clients",
            "PRIMARY lookup tool. Returns clients and their IDs; call this first \
             before any tool that needs a client_id. Use search_text to find clients \
             by name, email, or phone, and last_modified_date (ISO 8601) for \
             new/recent clients.",
        )
        .with_parameter(opt("search_text", "Search by name, email, or phone"))
        .with_parameter(opt_typed(
            "client_ids",
            "Specific client IDs to retrieve",
            "array",
        ))
        .with_parameter(opt_typed(
            "include_inactive",
            "Include inactive clients (default false)",
            "boolean",
        ))
        .with_parameter(opt(
            "last_modified_date",
            "Only clients created or modified after this date (ISO 8601)",
        ))
        .with_parameter(offset.clone()),
        "/client/clients",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_client_services",
            "Services, packages, and memberships purchased by one client. Requires \
             client_id from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt_typed("class_id", "Filter by class ID", "number"))
        .with_parameter(opt_typed("program_ids", "Filter by program IDs", "array"))
        .with_parameter(opt_typed(
            "session_type_ids",
            "Filter by session type IDs",
            "array",
        ))
        .with_parameter(opt_typed("location_ids", "Filter by location IDs", "array"))
        .with_parameter(opt_typed(
            "visit_count",
            "Number of visits to retrieve",
            "number",
        ))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/clientservices",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_client_complete_info",
            "Comprehensive profile for one client, including memberships, contracts, \
             and services. Requires client_id from get_clients.",
        )
        .with_parameter(client_id()),
        "/client/clientcompleteinfo",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_active_client_memberships",
            "Active memberships for one client. Requires client_id from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt_typed("location_id", "Filter by location ID", "number"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/activeclientmemberships",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_active_clients_memberships",
            "Active memberships for several clients at once. Requires a non-empty \
             client_ids array from get_clients.",
        )
        .with_parameter(
            ToolParameter::new(
                "client_ids",
                "Array of client IDs. Call get_clients first to obtain them.",
                true,
            )
            .with_type("array"),
        )
        .with_parameter(opt_typed("location_id", "Filter by location ID", "number"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/activeclientsmemberships",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_client_purchases",
            "Purchase history for one client; filter with start_date/end_date. \
             Requires client_id from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/clientpurchases",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_client_schedule",
            "Scheduled classes and appointments for one client. Requires client_id \
             from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/clientschedule",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_client_visits",
            "Visit history for one client. Requires client_id from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(opt_typed(
            "unpaids_only",
            "Only unpaid visits (default false)",
            "boolean",
        ))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/clientvisits",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_contact_logs",
            "Contact log entries for one client. Requires client_id from get_clients.",
        )
        .with_parameter(client_id())
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(opt_typed(
            "staff_ids",
            "Filter by staff member IDs",
            "array",
        ))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/client/contactlogs",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_schedule_items",
            "Appointment schedule items across the studio, filterable by date range, \
             staff, session type, and location.",
        )
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(opt_typed("staff_ids", "Filter by staff IDs", "array"))
        .with_parameter(opt_typed(
            "session_type_ids",
            "Filter by session type IDs",
            "array",
        ))
        .with_parameter(opt_typed("location_ids", "Filter by location IDs", "array"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/appointment/scheduleitems",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_active_session_times",
            "Bookable session times for appointments.",
        )
        .with_parameter(opt_typed("schedule_id", "Filter by schedule ID", "number"))
        .with_parameter(opt_typed(
            "session_type_ids",
            "Filter by session type IDs",
            "array",
        ))
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/appointment/activesessiontimes",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_sales",
            "Sales records, filterable by sale ID, date range, and payment method.",
        )
        .with_parameter(opt_typed("sale_id", "Filter by sale ID", "number"))
        .with_parameter(opt("start_sale_date_time", "Range start (ISO 8601)"))
        .with_parameter(opt("end_sale_date_time", "Range end (ISO 8601)"))
        .with_parameter(opt_typed(
            "payment_method_id",
            "Filter by payment method ID",
            "number",
        ))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/sale/sales",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_transactions",
            "Payment transactions, filterable by transaction ID, client, and date \
             range.",
        )
        .with_parameter(opt_typed(
            "transaction_id",
            "Filter by transaction ID",
            "number",
        ))
        .with_parameter(opt("client_id", "Filter by client ID"))
        .with_parameter(opt("start_date", "Range start (ISO 8601)"))
        .with_parameter(opt("end_date", "Range end (ISO 8601)"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/sale/transactions",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_services",
            "Pricing options (services) sold by the studio.",
        )
        .with_parameter(opt_typed("service_ids", "Filter by service IDs", "array"))
        .with_parameter(opt_typed("program_ids", "Filter by program IDs", "array"))
        .with_parameter(opt_typed(
            "session_type_ids",
            "Filter by session type IDs",
            "array",
        ))
        .with_parameter(opt_typed("location_ids", "Filter by location IDs", "array"))
        .with_parameter(opt_typed("staff_ids", "Filter by staff IDs", "array"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/sale/services",
    ));

    entries.push(entry(
        ToolDefinition::new("get_products", "Retail products sold by the studio.")
            .with_parameter(opt_typed("product_ids", "Filter by product IDs", "array"))
            .with_parameter(opt_typed(
                "category_ids",
                "Filter by category IDs",
                "array",
            ))
            .with_parameter(opt_typed(
                "sub_category_ids",
                "Filter by subcategory IDs",
                "array",
            ))
            .with_parameter(opt("search_text", "Search products by text"))
            .with_parameter(limit.clone())
            .with_parameter(offset.clone()),
        "/sale/products",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_products_inventory",
            "Inventory levels for retail products.",
        )
        .with_parameter(opt_typed("product_ids", "Filter by product IDs", "array"))
        .with_parameter(opt_typed("location_ids", "Filter by location IDs", "array"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/sale/productsinventory",
    ));

    entries.push(entry(
        ToolDefinition::new("get_packages", "Packages sold by the studio.")
            .with_parameter(opt_typed("package_ids", "Filter by package IDs", "array"))
            .with_parameter(opt_typed(
                "location_ids",
                "Filter by location IDs",
                "array",
            ))
            .with_parameter(limit.clone())
            .with_parameter(offset.clone()),
        "/sale/packages",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_memberships",
            "Membership types offered by the studio.",
        )
        .with_parameter(opt_typed(
            "membership_ids",
            "Filter by membership IDs",
            "array",
        ))
        .with_parameter(opt_typed("location_ids", "Filter by location IDs", "array"))
        .with_parameter(limit.clone())
        .with_parameter(offset.clone()),
        "/site/memberships",
    ));

    entries.push(entry(
        ToolDefinition::new(
            "get_session_types",
            "Session types configured for the studio.",
        )
        .with_parameter(opt_typed(
            "session_type_ids",
            "Filter by session type IDs",
            "array",
        ))
        .with_parameter(opt_typed("program_ids", "Filter by program IDs", "array"))
        .with_parameter(opt_typed(
            "online_only",
            "Only sessions bookable online (default false)",
            "boolean",
        ))
        .with_parameter(limit.clone())
        .with_parameter(offset),
        "/site/sessiontypes",
    ));

    entries
}

/// Definitions of the two composite tools.
pub fn composite_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            CLIENTS_WITH_VISITS,
            "AGGREGATE tool: clients AND their visit history in one call. Use for \
             questions like 'which clients returned for a second visit' or 'client \
             retention'. Fetches visits for every matching client automatically; \
             filter with min_visits/max_visits.",
        )
        .with_parameter(opt("search_text", "Search by name, email, or phone"))
        .with_parameter(opt_typed(
            "client_ids",
            "Specific client IDs to retrieve",
            "array",
        ))
        .with_parameter(opt(
            "last_modified_date",
            "Only clients created or modified after this date (ISO 8601)",
        ))
        .with_parameter(opt("visit_start_date", "Only count visits after this date"))
        .with_parameter(opt("visit_end_date", "Only count visits before this date"))
        .with_parameter(opt_typed(
            "min_visits",
            "Keep clients with at least this many visits",
            "number",
        ))
        .with_parameter(opt_typed(
            "max_visits",
            "Keep clients with at most this many visits",
            "number",
        ))
        .with_parameter(opt_typed(
            "include_inactive",
            "Include inactive clients (default false)",
            "boolean",
        ))
        .with_parameter(opt_typed(
            "limit",
            "Maximum clients to process (default 100)",
            "number",
        )),
        ToolDefinition::new(
            NON_MEMBER_TRIAL_CLIENTS,
            "CONVERSION tool: finds non-member clients who visited recently but have \
             not returned. Returns clients who are not current members, visited \
             within the recent window, and have nothing booked since.",
        )
        .with_parameter(opt_typed(
            "recent_window_days",
            "Look for visits within this many days ago (default 14)",
            "number",
        ))
        .with_parameter(opt_typed(
            "min_days_since_visit",
            "Minimum days since the last visit to count as lapsed (default 3)",
            "number",
        ))
        .with_parameter(opt_typed(
            "include_upcoming_bookings",
            "Exclude clients with future bookings (default true)",
            "boolean",
        ))
        .with_parameter(opt_typed(
            "limit",
            "Maximum clients to analyze (default 100)",
            "number",
        )),
    ]
}

/// The full catalog as a [`ToolSpec`].
pub fn build_spec() -> ToolSpec {
    let mut spec = ToolSpec::new();
    for entry in standard_entries() {
        spec = spec.register(entry.definition);
    }
    for definition in composite_definitions() {
        spec = spec.register(definition);
    }
    spec
}

/// Endpoint lookup for the single-endpoint tools.
pub fn endpoint_table() -> HashMap<String, &'static str> {
    standard_entries()
        .into_iter()
        .map(|entry| (entry.definition.name, entry.endpoint))
        .collect()
}

/// Wire key for a tool parameter: snake_case to PascalCase.
pub fn wire_key(param: &str) -> String {
    param
        .split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_twenty_one_tools() {
        let spec = build_spec();
        assert_eq!(spec.len(), 21);
        assert!(spec.contains("get_clients"));
        assert!(spec.contains(CLIENTS_WITH_VISITS));
        assert!(spec.contains(NON_MEMBER_TRIAL_CLIENTS));
    }

    #[test]
    fn client_detail_tools_require_client_id() {
        let spec = build_spec();
        for name in [
            "get_client_services",
            "get_client_complete_info",
            "get_active_client_memberships",
            "get_client_purchases",
            "get_client_schedule",
            "get_client_visits",
            "get_contact_logs",
        ] {
            let tool = spec.get(name).unwrap();
            assert_eq!(tool.required_parameters(), vec!["client_id"], "{name}");
        }
    }

    #[test]
    fn batch_memberships_requires_client_ids_array() {
        let spec = build_spec();
        let tool = spec.get("get_active_clients_memberships").unwrap();
        assert_eq!(tool.required_parameters(), vec!["client_ids"]);
        let param = tool
            .parameters
            .iter()
            .find(|p| p.name == "client_ids")
            .unwrap();
        assert_eq!(param.param_type, "array");
    }

    #[test]
    fn composites_have_no_required_parameters() {
        let spec = build_spec();
        assert!(spec
            .get(CLIENTS_WITH_VISITS)
            .unwrap()
            .required_parameters()
            .is_empty());
        assert!(spec
            .get(NON_MEMBER_TRIAL_CLIENTS)
            .unwrap()
            .required_parameters()
            .is_empty());
    }

    #[test]
    fn endpoint_table_covers_all_standard_tools() {
        let table = endpoint_table();
        assert_eq!(table.len(), 19);
        assert_eq!(table["get_clients"], "/client/clients");
        assert_eq!(table["get_session_types"], "/site/sessiontypes");
        assert!(!table.contains_key(CLIENTS_WITH_VISITS));
    }

    #[test]
    fn wire_keys_are_pascal_case() {
        assert_eq!(wire_key("client_id"), "ClientId");
        assert_eq!(wire_key("search_text"), "SearchText");
        assert_eq!(wire_key("last_modified_date"), "LastModifiedDate");
        assert_eq!(wire_key("session_type_ids"), "SessionTypeIds");
        assert_eq!(wire_key("limit"), "Limit");
    }
}

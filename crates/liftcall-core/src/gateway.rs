//! Operator console request handling.
//!
//! The console speaks a tiny subset of HTTP/1.1. The gateway is a pure
//! function of the request head and the [`RequestMachine`]: the driver reads
//! the head off the socket, calls [`Gateway::handle`], and writes
//! [`GatewayReply::render`] back before closing the connection.
//!
//! | Request | Reply |
//! |---|---|
//! | `GET /status` | `200` status snapshot |
//! | `GET /currentfloor/{n}` | `200`, `400` invalid floor, `409` busy |
//! | `GET /floor/{n}` | `200`, `400` invalid floor, `409` busy |
//! | any other `GET` | `200` control page |
//! | anything else | `404` |

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    display::DisplayLines,
    error::MachineError,
    machine::{MIN_FLOOR, RequestMachine, RobotState, Transition},
    page,
};

/// Highest floor served by the elevator.
pub const DEFAULT_MAX_FLOOR: u8 = 7;

/// Gateway configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Highest selectable floor (lowest is always 1)
    pub max_floor: u8,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { max_floor: DEFAULT_MAX_FLOOR }
    }
}

/// Classified request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /status`
    Status,
    /// `GET /currentfloor/{n}` (0 if `n` is missing or not a number)
    CurrentFloor(u32),
    /// `GET /floor/{n}` (0 if `n` is missing or not a number)
    TargetFloor(u32),
    /// Any other `GET`
    ControlPage,
    /// Not a `GET`
    NotFound,
}

impl Route {
    /// Classify a request head.
    #[must_use]
    pub fn parse(request: &str) -> Self {
        let Some(line) = request.lines().next() else {
            return Self::NotFound;
        };
        if !line.starts_with("GET /") {
            return Self::NotFound;
        }

        if line.starts_with("GET /status") {
            Self::Status
        } else if line.starts_with("GET /currentfloor/") {
            Self::CurrentFloor(extract_floor_number(line, "currentfloor"))
        } else if line.starts_with("GET /floor/") {
            Self::TargetFloor(extract_floor_number(line, "floor"))
        } else {
            Self::ControlPage
        }
    }
}

/// Parse the number following `/{route}/` up to the next space.
///
/// Returns 0 if the segment is missing, empty or not a decimal number.
#[must_use]
pub fn extract_floor_number(request: &str, route: &str) -> u32 {
    let marker = format!("/{route}/");
    let Some(start) = request.find(&marker).map(|i| i + marker.len()) else {
        return 0;
    };

    let rest = &request[start..];
    let end = rest.find([' ', '\r', '\n']).unwrap_or(rest.len());
    rest[..end].parse().unwrap_or(0)
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Operator-visible status string
    pub status: String,
    /// Stored current floor (0 if unset)
    pub current_floor: u8,
    /// Stored target floor (0 if unset)
    pub requested_floor: u8,
}

impl StatusSnapshot {
    /// Snapshot of `machine`.
    #[must_use]
    pub fn of(machine: &RequestMachine) -> Self {
        let request = machine.floor_request();
        Self {
            status: machine.state().description().to_string(),
            current_floor: request.current_floor,
            requested_floor: request.target_floor,
        }
    }
}

/// Response to one console request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header
    pub content_type: &'static str,
    /// Response body
    pub body: String,
    /// Display update caused by the request, if any
    pub display: Option<DisplayLines>,
}

impl GatewayReply {
    fn json(status: u16, body: &Value) -> Self {
        Self { status, content_type: "application/json", body: body.to_string(), display: None }
    }

    fn html(body: String) -> Self {
        Self { status: 200, content_type: "text/html", body, display: None }
    }

    fn with_display(mut self, display: DisplayLines) -> Self {
        self.display = Some(display);
        self
    }

    /// Reason phrase for the status code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            409 => "Conflict",
            _ => "Not Found",
        }
    }

    /// Body parsed as JSON, for JSON replies.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Full HTTP/1.1 response with `Connection: close`.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len(),
            self.body,
        )
    }
}

/// Console request handler.
#[derive(Debug, Clone, Default)]
pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    /// Gateway with the given floor range.
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Gateway configuration.
    #[must_use]
    pub fn config(&self) -> GatewayConfig {
        self.config
    }

    /// Current status, always available.
    #[must_use]
    pub fn query_status(&self, machine: &RequestMachine) -> StatusSnapshot {
        StatusSnapshot::of(machine)
    }

    /// Accept both floors at once. Nothing is stored unless both are valid
    /// and the robot is `Idle`.
    ///
    /// # Errors
    ///
    /// - `MachineError::RequestInProgress` if the robot is not `Idle`
    /// - `MachineError::InvalidFloor` if either floor is out of range
    pub fn try_accept_floor_selection(
        &self,
        machine: &mut RequestMachine,
        current_floor: u32,
        target_floor: u32,
    ) -> Result<Transition, MachineError> {
        ensure_idle(machine)?;
        let current_floor = self.validate(current_floor)?;
        let target_floor = self.validate(target_floor)?;

        machine.select_current_floor(current_floor)?;
        machine.select_target_floor(target_floor)
    }

    /// Handle one request head.
    pub fn handle(&self, request: &str, machine: &mut RequestMachine) -> GatewayReply {
        match Route::parse(request) {
            Route::Status => GatewayReply::json(200, &json!(self.query_status(machine))),
            Route::ControlPage => GatewayReply::html(page::render(self.config.max_floor)),
            Route::CurrentFloor(floor) => self.select_current(machine, floor),
            Route::TargetFloor(floor) => self.select_target(machine, floor),
            Route::NotFound => {
                tracing::debug!(request = request.lines().next().unwrap_or(""), "Unknown route");
                GatewayReply::json(404, &json!({ "success": false, "error": "Not found" }))
            },
        }
    }

    fn select_current(&self, machine: &mut RequestMachine, floor: u32) -> GatewayReply {
        let result = ensure_idle(machine)
            .and_then(|()| self.validate(floor))
            .and_then(|floor| machine.select_current_floor(floor));

        match result {
            Ok(()) => {
                tracing::info!(floor, "Current floor selected");
                GatewayReply::json(200, &json!({ "success": true, "currentFloor": floor }))
                    .with_display(DisplayLines::new("Current floor:", floor.to_string()))
            },
            Err(err) => reject(&err, machine),
        }
    }

    fn select_target(&self, machine: &mut RequestMachine, floor: u32) -> GatewayReply {
        let result = ensure_idle(machine)
            .and_then(|()| self.validate(floor))
            .and_then(|floor| machine.select_target_floor(floor));

        match result {
            Ok(transition) => {
                tracing::info!(
                    floor,
                    current_floor = machine.floor_request().current_floor,
                    from = ?transition.from,
                    to = ?transition.to,
                    "Floor request accepted"
                );
                GatewayReply::json(
                    200,
                    &json!({
                        "success": true,
                        "floor": floor,
                        "status": machine.state().description(),
                    }),
                )
                .with_display(DisplayLines::new("Target floor:", floor.to_string()))
            },
            Err(err) => reject(&err, machine),
        }
    }

    fn validate(&self, floor: u32) -> Result<u8, MachineError> {
        u8::try_from(floor)
            .ok()
            .filter(|f| (MIN_FLOOR..=self.config.max_floor).contains(f))
            .ok_or(MachineError::InvalidFloor { floor })
    }
}

fn ensure_idle(machine: &RequestMachine) -> Result<(), MachineError> {
    match machine.state() {
        RobotState::Idle => Ok(()),
        state => Err(MachineError::RequestInProgress { state }),
    }
}

fn reject(err: &MachineError, machine: &RequestMachine) -> GatewayReply {
    if err.is_conflict() {
        tracing::warn!(%err, "Floor selection rejected");
        GatewayReply::json(
            409,
            &json!({
                "success": false,
                "error": "Request already in progress",
                "status": machine.state().description(),
            }),
        )
    } else {
        tracing::warn!(%err, "Invalid floor selection");
        GatewayReply::json(400, &json!({ "success": false, "error": "Invalid floor" }))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::machine::FloorRequest;

    fn get(path: &str) -> String {
        format!("GET {path} HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n")
    }

    #[test]
    fn parse_routes() {
        assert_eq!(Route::parse(&get("/status")), Route::Status);
        assert_eq!(Route::parse(&get("/currentfloor/3")), Route::CurrentFloor(3));
        assert_eq!(Route::parse(&get("/floor/7")), Route::TargetFloor(7));
        assert_eq!(Route::parse(&get("/")), Route::ControlPage);
        assert_eq!(Route::parse(&get("/favicon.ico")), Route::ControlPage);
        assert_eq!(Route::parse("POST /floor/3 HTTP/1.1\r\n\r\n"), Route::NotFound);
        assert_eq!(Route::parse(""), Route::NotFound);
    }

    #[test]
    fn extract_floor_edge_cases() {
        assert_eq!(extract_floor_number("GET /floor/5 HTTP/1.1", "floor"), 5);
        assert_eq!(extract_floor_number("GET /floor/ HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /floor/abc HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /floor/-2 HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /status HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /currentfloor/4 HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /floor/99999999999 HTTP/1.1", "floor"), 0);
        assert_eq!(extract_floor_number("GET /floor/6", "floor"), 6);
    }

    #[test]
    fn status_on_boot() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        let reply = gateway.handle(&get("/status"), &mut machine);
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.json_body(),
            Some(json!({ "status": "Ready for floor request", "currentFloor": 0, "requestedFloor": 0 }))
        );
    }

    #[test]
    fn floor_selection_flow() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        let reply = gateway.handle(&get("/currentfloor/3"), &mut machine);
        assert_eq!(reply.json_body(), Some(json!({ "success": true, "currentFloor": 3 })));
        assert_eq!(machine.state(), RobotState::Idle);

        let reply = gateway.handle(&get("/floor/7"), &mut machine);
        assert_eq!(
            reply.json_body(),
            Some(json!({ "success": true, "floor": 7, "status": "Request sent" }))
        );
        assert_eq!(machine.state(), RobotState::RequestAccepted);
        assert_eq!(reply.display, Some(DisplayLines::new("Target floor:", "7")));
    }

    #[test]
    fn invalid_floor_is_bad_request() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        for path in ["/floor/0", "/floor/8", "/floor/x", "/currentfloor/300"] {
            let reply = gateway.handle(&get(path), &mut machine);
            assert_eq!(reply.status, 400, "path {path}");
            assert_eq!(reply.json_body(), Some(json!({ "success": false, "error": "Invalid floor" })));
        }
        assert_eq!(machine.floor_request(), FloorRequest::default());
    }

    #[test]
    fn busy_is_conflict_before_validation() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();
        gateway.handle(&get("/floor/4"), &mut machine);

        // Busy wins even for an invalid floor
        let reply = gateway.handle(&get("/floor/0"), &mut machine);
        assert_eq!(reply.status, 409);
        assert_eq!(
            reply.json_body(),
            Some(json!({
                "success": false,
                "error": "Request already in progress",
                "status": "Request sent",
            }))
        );
        assert_eq!(machine.floor_request().target_floor, 4);
    }

    #[test]
    fn other_get_serves_page() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        let reply = gateway.handle(&get("/"), &mut machine);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "text/html");
        assert!(reply.body.contains("/floor/"));
    }

    #[test]
    fn non_get_is_not_found() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        let reply = gateway.handle("DELETE /status HTTP/1.1\r\n\r\n", &mut machine);
        assert_eq!(reply.status, 404);
        assert!(reply.render().starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn render_sets_length_and_close() {
        let reply = GatewayReply::json(200, &json!({ "success": true }));
        let rendered = reply.render();

        assert!(rendered.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(rendered.contains("Content-Type: application/json\r\n"));
        assert!(rendered.contains(&format!("Content-Length: {}\r\n", reply.body.len())));
        assert!(rendered.contains("Connection: close\r\n\r\n"));
        assert!(rendered.ends_with(&reply.body));
    }

    #[test]
    fn combined_selection_is_atomic() {
        let gateway = Gateway::default();
        let mut machine = RequestMachine::new();

        let result = gateway.try_accept_floor_selection(&mut machine, 2, 9);
        assert_eq!(result, Err(MachineError::InvalidFloor { floor: 9 }));
        assert_eq!(machine.floor_request(), FloorRequest::default());

        let transition = gateway.try_accept_floor_selection(&mut machine, 2, 5).unwrap();
        assert_eq!(transition.to, RobotState::RequestAccepted);
        assert_eq!(machine.floor_request(), FloorRequest { current_floor: 2, target_floor: 5 });
    }

    proptest! {
        #[test]
        fn extract_never_panics(request in ".*", route in "[a-z]{0,12}") {
            let _ = extract_floor_number(&request, &route);
        }

        #[test]
        fn busy_rejection_leaves_request_unchanged(current in 1u8..=7, target in 1u8..=7, path in "/(currentfloor|floor)/[0-9a-z]{0,4}") {
            let gateway = Gateway::default();
            let mut machine = RequestMachine::new();
            gateway.try_accept_floor_selection(&mut machine, u32::from(current), u32::from(target)).unwrap();
            let before = machine.floor_request();

            let reply = gateway.handle(&get(&path), &mut machine);
            prop_assert_eq!(reply.status, 409);
            prop_assert_eq!(machine.floor_request(), before);
        }
    }
}

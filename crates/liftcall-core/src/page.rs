//! Static HTML control page served on every unrouted `GET`.

use std::fmt::Write;

const HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Robot Elevator Control</title>
<style>
body { font-family: sans-serif; max-width: 420px; margin: 0 auto; padding: 16px; }
h1 { font-size: 1.3em; }
.floors { display: grid; grid-template-columns: repeat(4, 1fr); gap: 8px; margin-bottom: 16px; }
button { padding: 14px; font-size: 1.1em; border: 1px solid #888; border-radius: 6px; background: #f4f4f4; }
button.selected { background: #4a90d9; color: #fff; }
#status { padding: 10px; border-radius: 6px; background: #eef; }
</style>
</head>
<body>
<h1>Robot Elevator Control</h1>
"#;

const TAIL: &str = r#"<div id="status">Loading...</div>
<script>
let currentFloor = 0;
function mark(group, floor) {
  document.querySelectorAll('#' + group + ' button').forEach(b => {
    b.classList.toggle('selected', b.dataset.floor == floor);
  });
}
function send(path, group, floor) {
  fetch(path + floor).then(r => r.json()).then(data => {
    if (!data.success) { alert(data.error || data.status); return; }
    if (group == 'current') { currentFloor = floor; }
    mark(group, floor);
    refresh();
  });
}
function selectCurrent(floor) {
  send('/currentfloor/', 'current', floor);
}
function selectTarget(floor) {
  if (currentFloor <= 0) {
    alert('Please select your current floor first!');
    return;
  }
  if (currentFloor == floor) {
    alert('You are already on floor ' + floor + '!');
    return;
  }
  send('/floor/', 'target', floor);
}
function refresh() {
  fetch('/status').then(r => r.json()).then(data => {
    currentFloor = data.currentFloor;
    if (currentFloor == 0) { mark('current', 0); }
    if (data.requestedFloor == 0) { mark('target', 0); }
    document.getElementById('status').textContent =
      data.status + ' (current ' + data.currentFloor + ', requested ' + data.requestedFloor + ')';
  });
}
setInterval(refresh, 2000);
refresh();
</script>
</body>
</html>
"#;

/// Render the page with one button per floor in each group.
pub(crate) fn render(max_floor: u8) -> String {
    let mut page = String::from(HEAD);
    floor_group(&mut page, "Current floor", "current", "selectCurrent", max_floor);
    floor_group(&mut page, "Target floor", "target", "selectTarget", max_floor);
    page.push_str(TAIL);
    page
}

fn floor_group(page: &mut String, title: &str, id: &str, handler: &str, max_floor: u8) {
    let _ = writeln!(page, "<h2>{title}</h2>\n<div class=\"floors\" id=\"{id}\">");
    for floor in 1..=max_floor {
        let _ = writeln!(
            page,
            "<button data-floor=\"{floor}\" onclick=\"{handler}({floor})\">{floor}</button>"
        );
    }
    page.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_button_per_floor() {
        let page = render(7);
        assert_eq!(page.matches("onclick=\"selectTarget(").count(), 7);
        assert_eq!(page.matches("onclick=\"selectCurrent(").count(), 7);
        assert!(page.ends_with("</html>\n"));
    }

    #[test]
    fn target_selection_guarded_client_side() {
        let page = render(7);
        let guard = &page[page.find("function selectTarget").unwrap()..];
        let guard = &guard[..guard.find("function refresh").unwrap()];

        assert!(guard.contains("if (currentFloor <= 0)"));
        assert!(guard.contains("Please select your current floor first!"));
        assert!(guard.contains("if (currentFloor == floor)"));
        assert!(guard.contains("'You are already on floor ' + floor + '!'"));
        // Both checks run before the request goes out
        assert!(guard.find("already on floor").unwrap() < guard.find("send('/floor/'").unwrap());
    }
}

use crate::settings::WidgetConfig;

const TEMPLATE: &str = r#"// docs-support loader
(function () {
  "use strict";
  var config = __WIDGET_CONFIG__;
  var moduleUrl = __MODULE_URL__;

  function loadChatSdk(chat) {
    if (!chat || !chat.script_src) return;
    var existing = document.querySelectorAll("script[src]");
    for (var i = 0; i < existing.length; i++) {
      if (existing[i].getAttribute("src") === chat.script_src) return;
    }
    var script = document.createElement("script");
    script.src = chat.script_src;
    script.async = true;
    script.setAttribute("data-website-id", chat.website_id);
    script.setAttribute("data-project-name", chat.project_name);
    script.setAttribute("data-project-color", chat.project_color);
    script.setAttribute("data-project-logo", chat.project_logo);
    script.setAttribute("data-button-hide", "true");
    document.head.appendChild(script);
  }

  function mount() {
    import(moduleUrl)
      .then(function (mod) {
        return mod.default().then(function () {
          mod.mount_support_widget(config);
        });
      })
      .catch(function (err) {
        console.warn("docs-support: widget failed to load", err);
      });
  }

  loadChatSdk(config.chat);
  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", mount);
  } else {
    mount();
  }
})();
"#;

/// Bootstrap script for pages: loads the chat SDK once, then the wasm widget.
pub fn loader_script(widget: &WidgetConfig, module_url: &str) -> String {
    let config = serde_json::to_string(widget).unwrap_or_else(|_| "{}".to_string());
    let module_url = serde_json::to_string(module_url).unwrap_or_else(|_| "\"\"".to_string());
    TEMPLATE
        .replace("__WIDGET_CONFIG__", &config)
        .replace("__MODULE_URL__", &module_url)
}

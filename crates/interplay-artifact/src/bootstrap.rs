//! Fixed bootstrap code injected into every synthesized document.
//!
//! Everything here is plain ES5 so it runs unchanged in old embedded browsers
//! and in the validation interpreter.

/// Id of the panel that replaces the surface when behavior throws.
pub const DIAGNOSTIC_PANEL_ID: &str = "__interaction_diagnostic";
pub const UNDERLAY_ID: &str = "__interaction_underlay";
pub const MEDIA_ELEMENT_ID: &str = "__interaction_media";
pub const OVERLAY_ID: &str = "__interaction_overlay";

/// Global names assigned by the data bootstrap.
pub const CONFIG_GLOBAL: &str = "__INTERACTION_CONFIG__";
pub const DATA_GLOBAL: &str = "__INTERACTION_DATA__";

/// Diagnostic panel plus a last-resort `error` listener.
pub const DIAGNOSTIC_JS: &str = r#"(function () {
  function describe(err) {
    if (err && typeof err === 'object') {
      return {
        name: String(err.name || 'Error'),
        message: String(err.message || err),
        stack: String(err.stack || '')
      };
    }
    return { name: 'Error', message: String(err), stack: '' };
  }
  window.__interactionShowDiagnostic = function (err) {
    var info = describe(err);
    window.__interactionLastError = info;
    try { console.error('[interaction] ' + info.name + ': ' + info.message); } catch (_) {}
    var panel = document.createElement('div');
    panel.id = '__interaction_diagnostic';
    panel.setAttribute('role', 'alert');
    panel.style.cssText = 'font-family:monospace;padding:16px;background:#fff4f4;color:#8a1010;white-space:pre-wrap;';
    var title = document.createElement('h2');
    title.textContent = info.name;
    var message = document.createElement('p');
    message.textContent = info.message;
    var stack = document.createElement('pre');
    stack.textContent = info.stack;
    panel.appendChild(title);
    panel.appendChild(message);
    panel.appendChild(stack);
    document.body.innerHTML = '';
    document.body.appendChild(panel);
    return info;
  };
  window.addEventListener('error', function (event) {
    window.__interactionShowDiagnostic(event && (event.error || event.message));
  });
})();"#;

/// Networked bridge client: `window.interaction` over `parent.postMessage`.
pub const BRIDGE_CLIENT_JS: &str = r#"(function () {
  var CALL_TIMEOUT_MS = 30000;
  var sequence = 0;
  var pending = {};
  var subscription = { state: 'uninitialized', id: null, handler: null };

  function nextId() {
    sequence += 1;
    return 'rpc-' + Date.now() + '-' + sequence;
  }
  function post(type, id, payload) {
    window.parent.postMessage({ type: type, correlationId: id, payload: payload || {} }, '*');
  }
  function notify(type, payload) {
    post(type, nextId(), payload);
  }
  function request(type, payload) {
    return new Promise(function (resolve) {
      var id = nextId();
      var timer = setTimeout(function () {
        if (pending[id]) {
          delete pending[id];
          resolve({ result: null, error: 'Request timed out after ' + CALL_TIMEOUT_MS + 'ms: ' + type });
        }
      }, CALL_TIMEOUT_MS);
      pending[id] = {
        type: type,
        resolve: function (reply) { clearTimeout(timer); resolve(reply); }
      };
      try {
        post(type, id, payload);
      } catch (err) {
        delete pending[id];
        clearTimeout(timer);
        resolve({ result: null, error: 'Transport error: ' + String((err && err.message) || err) });
      }
    });
  }

  window.addEventListener('message', function (event) {
    var msg = event && event.data;
    if (!msg || typeof msg.type !== 'string') { return; }
    var payload = msg.payload || {};
    if (msg.type === 'subscription-push') {
      if (subscription.state === 'active' && payload.subscriptionId === subscription.id && subscription.handler) {
        subscription.handler(payload.data);
      }
      return;
    }
    if (msg.type === 'subscribe-response') {
      if (subscription.state === 'pending' && msg.correlationId === subscription.id) {
        if (payload.error != null) {
          subscription = { state: 'torndown', id: subscription.id, handler: null };
        } else {
          subscription.state = 'active';
        }
      }
      return;
    }
    var entry = pending[msg.correlationId];
    if (!entry || msg.type !== entry.type + '-response') { return; }
    delete pending[msg.correlationId];
    entry.resolve({
      result: payload.result === undefined ? null : payload.result,
      error: payload.error == null ? null : String(payload.error)
    });
  });

  window.interaction = {
    emitEvent: function (name, data) { notify('emit-event', { name: name, data: data }); },
    updateState: function (state) { notify('update-state', { state: state }); },
    ready: function () { notify('ready', {}); },
    minimizeChat: function () { notify('minimize-chat', {}); },
    showChat: function () { notify('show-chat', {}); },
    enterFullscreen: function () { notify('enter-fullscreen', {}); },
    exitFullscreen: function () { notify('exit-fullscreen', {}); },
    showScript: function (script) { notify('show-script', { script: script }); },
    hideSnack: function () { notify('hide-snack', {}); },
    getState: function () { return request('get-state', {}); },
    saveInstanceData: function (data) { return request('save-instance-data', { data: data }); },
    queryInstanceData: function (query) { return request('query-instance-data', { query: query }); },
    saveProgress: function (progress) { return request('save-progress', { progress: progress }); },
    queryProgress: function () { return request('query-progress', {}); },
    markComplete: function () { return request('mark-complete', {}); },
    incrementProgress: function (amount) { return request('increment-progress', { amount: amount == null ? 1 : amount }); },
    fetchPublicProfile: function (userId) { return request('fetch-public-profile', userId ? { userId: userId } : {}); },
    postToChat: function (message) { return request('post-to-chat', { message: message }); },
    showSnack: function (message, durationMs) {
      var payload = { message: message };
      if (durationMs != null) { payload.durationMs = durationMs; }
      return request('show-snack', payload);
    },
    subscribe: function (topic, handler) {
      if (typeof topic === 'function') { handler = topic; topic = null; }
      if (subscription.state === 'pending' || subscription.state === 'active') {
        throw new Error('A subscription is already ' + subscription.state + '; unsubscribe first');
      }
      var id = nextId();
      subscription = { state: 'pending', id: id, handler: handler };
      var payload = { subscriptionId: id };
      if (topic) { payload.topic = topic; }
      post('subscribe', id, payload);
      return id;
    },
    unsubscribe: function () {
      if (subscription.state !== 'pending' && subscription.state !== 'active') { return false; }
      var id = subscription.id;
      subscription = { state: 'torndown', id: id, handler: null };
      notify('unsubscribe', { subscriptionId: id });
      return true;
    }
  };
})();"#;

/// Preview: same surface, answered from in-document state. Nothing leaves the frame.
pub const PREVIEW_STUBS_JS: &str = r#"(function () {
  var local = {
    state: {},
    instanceData: [],
    progress: null,
    count: 0,
    completed: false,
    chat: [],
    snack: null,
    subscription: { state: 'uninitialized', id: null }
  };
  var sequence = 0;
  function log(type, payload) {
    if (window.console) { console.info('[interaction preview] ' + type, payload === undefined ? '' : payload); }
  }
  function ok(result) {
    return Promise.resolve({ result: result === undefined ? null : result, error: null });
  }
  window.__interactionPreview = local;
  window.interaction = {
    emitEvent: function (name, data) { log('emit-event', { name: name, data: data }); },
    updateState: function (state) {
      if (state && typeof state === 'object') {
        for (var key in state) {
          if (Object.prototype.hasOwnProperty.call(state, key)) { local.state[key] = state[key]; }
        }
      } else {
        local.state = state;
      }
      log('update-state', state);
    },
    ready: function () { log('ready'); },
    minimizeChat: function () { log('minimize-chat'); },
    showChat: function () { log('show-chat'); },
    enterFullscreen: function () { log('enter-fullscreen'); },
    exitFullscreen: function () { log('exit-fullscreen'); },
    showScript: function (script) { log('show-script', script); },
    hideSnack: function () { local.snack = null; log('hide-snack'); },
    getState: function () { return ok(local.state); },
    saveInstanceData: function (data) {
      local.instanceData.push(data);
      return ok({ saved: true, count: local.instanceData.length });
    },
    queryInstanceData: function () { return ok(local.instanceData.slice()); },
    saveProgress: function (progress) { local.progress = progress; return ok({ saved: true }); },
    queryProgress: function () {
      return ok({ progress: local.progress, count: local.count, completed: local.completed });
    },
    markComplete: function () { local.completed = true; return ok({ completed: true }); },
    incrementProgress: function (amount) {
      local.count += (amount == null ? 1 : Number(amount));
      return ok({ count: local.count });
    },
    fetchPublicProfile: function (userId) {
      return ok({ id: userId || 'preview-user', displayName: 'Preview Learner' });
    },
    postToChat: function (message) { local.chat.push(String(message)); return ok({ posted: true }); },
    showSnack: function (message, durationMs) {
      local.snack = { message: String(message), durationMs: durationMs == null ? 4000 : durationMs };
      return ok({ shown: true, durationMs: local.snack.durationMs });
    },
    subscribe: function (topic, handler) {
      if (local.subscription.state === 'active') {
        throw new Error('A subscription is already active; unsubscribe first');
      }
      sequence += 1;
      local.subscription = { state: 'active', id: 'preview-' + sequence };
      return local.subscription.id;
    },
    unsubscribe: function () {
      if (local.subscription.state !== 'active') { return false; }
      local.subscription = { state: 'torndown', id: local.subscription.id };
      return true;
    }
  };
})();"#;

/// Playback controls for the media overlay variant, bound to the media element.
pub const MEDIA_CONTROLS_JS: &str = r#"(function () {
  function media() { return document.getElementById('__interaction_media'); }
  function withMedia(fn, fallback) {
    var el = media();
    return el ? fn(el) : fallback;
  }
  window.player = {
    play: function () {
      return withMedia(function (el) {
        var started = el.play();
        return started && typeof started.then === 'function' ? started : Promise.resolve();
      }, Promise.resolve());
    },
    pause: function () { withMedia(function (el) { el.pause(); }); },
    seek: function (seconds) {
      withMedia(function (el) { el.currentTime = Math.max(0, Number(seconds) || 0); });
    },
    setVolume: function (volume) {
      withMedia(function (el) { el.volume = Math.min(1, Math.max(0, Number(volume) || 0)); });
    },
    getCurrentTime: function () { return withMedia(function (el) { return el.currentTime || 0; }, 0); },
    getDuration: function () {
      return withMedia(function (el) { return isFinite(el.duration) ? el.duration : 0; }, 0);
    },
    isPlaying: function () { return withMedia(function (el) { return !el.paused && !el.ended; }, false); }
  };
})();"#;

/// Layout for the overlay variants: underlay fills the frame, overlay on top.
pub const OVERLAY_CSS: &str = "html,body{margin:0;height:100%;}\
#__interaction_underlay,#__interaction_media{position:fixed;inset:0;width:100%;height:100%;border:0;z-index:0;background:#000;}\
#__interaction_overlay{position:fixed;inset:0;z-index:1;pointer-events:none;}\
#__interaction_overlay>*{pointer-events:auto;}";

/// Data bootstrap: first script, own error boundary. Both arguments must
/// already be script-safe JSON.
pub fn data_bootstrap(config_json: &str, data_json: &str) -> String {
    format!(
        "(function () {{\n  try {{\n    window.{cfg} = {config};\n    window.{data} = {payload};\n  }} catch (err) {{\n    window.{cfg} = {{}};\n    window.{data} = {{}};\n    if (window.console) {{ console.error('[interaction] seed data bootstrap failed', err); }}\n  }}\n}})();",
        cfg = CONFIG_GLOBAL,
        data = DATA_GLOBAL,
        config = config_json,
        payload = data_json,
    )
}

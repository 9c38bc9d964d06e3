//! Server-rendered wall page.
//!
//! The page works without scripts (plain form posts and redirects). The inline
//! script layers on the character counter, drag-and-drop with an attachment
//! preview, the submit shortcut, local-time timestamps and the live post stream.

use crate::components::{Composer, Profile};
use crate::handlers::form::{BODY_FIELD, FILE_FIELD, UPLOADER_NAME_FIELD};
use crate::models::{MediaKind, Post, MAX_BODY_CHARS, MAX_UPLOADER_NAME_CHARS};
use crate::services::media::accept_attribute;
use std::fmt::Write;

/// Minimal HTML escaping for text and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn render_wall(profile: &Profile, posts: &[Post], composer: &Composer) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Wall</title>\n",
    );
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n<div class=\"layout\">\n");
    render_profile(&mut html, profile);
    html.push_str("<main>\n<h1>Wall</h1>\n");
    render_composer(&mut html, composer);
    render_feed(&mut html, posts);
    html.push_str("</main>\n</div>\n");
    html.push_str(SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn render_profile(html: &mut String, profile: &Profile) {
    let _ = write!(
        html,
        "<aside class=\"profile\">\n<img src=\"{}\" alt=\"{}\" class=\"avatar\">\n<h2>{}</h2>\n<h3>{}</h3>\n<dl>\n",
        escape_html(profile.avatar_url),
        escape_html(profile.name),
        escape_html(profile.name),
        escape_html(profile.section_title),
    );
    for field in &profile.fields {
        let _ = write!(
            html,
            "<dt>{}</dt><dd>{}</dd>\n",
            escape_html(field.label),
            escape_html(field.value)
        );
    }
    html.push_str("</dl>\n</aside>\n");
}

fn render_composer(html: &mut String, composer: &Composer) {
    let _ = write!(
        html,
        "<form id=\"composer\" class=\"composer\" method=\"post\" action=\"/posts\" enctype=\"multipart/form-data\">\n\
         <input type=\"text\" name=\"{name_field}\" placeholder=\"Your name\" maxlength=\"{max_name}\" value=\"{name}\" required>\n\
         <textarea name=\"{body_field}\" id=\"composer-body\" placeholder=\"What's on your mind?\" data-max-chars=\"{max_body}\">{body}</textarea>\n\
         <div id=\"dropzone\" class=\"dropzone\">\n\
         <input type=\"file\" name=\"{file_field}\" id=\"composer-file\" accept=\"{accept}\">\n\
         <span>Drag and drop files here</span>\n\
         </div>\n\
         <div id=\"composer-preview\" class=\"preview\" hidden></div>\n\
         <div class=\"composer-footer\"><span id=\"char-count\">{count}/{max_body}</span>\
         <button type=\"submit\" id=\"composer-share\">Share</button></div>\n",
        name_field = UPLOADER_NAME_FIELD,
        max_name = MAX_UPLOADER_NAME_CHARS,
        name = escape_html(composer.uploader_name()),
        body_field = BODY_FIELD,
        max_body = MAX_BODY_CHARS,
        body = escape_html(composer.body()),
        file_field = FILE_FIELD,
        accept = accept_attribute(),
        count = composer.char_count(),
    );
    if let Some(error) = composer.error() {
        let _ = write!(html, "<p class=\"error\" role=\"alert\">{}</p>\n", escape_html(error));
    }
    html.push_str("</form>\n");
}

fn render_feed(html: &mut String, posts: &[Post]) {
    html.push_str("<section id=\"feed\" class=\"feed\">\n");
    for post in posts {
        render_post(html, post);
    }
    html.push_str("</section>\n");
}

fn render_post(html: &mut String, post: &Post) {
    let _ = write!(
        html,
        "<article class=\"post\" data-id=\"{id}\">\n<header><strong>{uploader}</strong> \
         <time datetime=\"{iso}\">{fallback}</time></header>\n",
        id = escape_html(&post.id),
        uploader = escape_html(&post.uploader_name),
        iso = post.timestamp.to_rfc3339(),
        fallback = post.timestamp.format("%b %-d, %Y %H:%M UTC"),
    );
    if !post.body.is_empty() {
        let _ = write!(html, "<p>{}</p>\n", escape_html(&post.body));
    }
    if let Some(media) = &post.media {
        let url = escape_html(&media.url);
        match media.kind {
            MediaKind::Image => {
                let _ = write!(html, "<img src=\"{}\" alt=\"Post attachment\" loading=\"lazy\">\n", url);
            }
            MediaKind::Video => {
                let _ = write!(html, "<video src=\"{}\" controls preload=\"metadata\"></video>\n", url);
            }
        }
    }
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/posts/{}/delete\"><button type=\"submit\">Delete</button></form>\n</article>\n",
        urlencoding::encode(&post.id),
    );
}

const STYLE: &str = r#"<style>
body { font-family: system-ui, sans-serif; margin: 0; background: #f0f2f5; }
.layout { display: flex; gap: 24px; max-width: 960px; margin: 24px auto; }
.profile { width: 220px; background: #fff; padding: 16px; border-radius: 8px; }
.avatar { width: 100%; border-radius: 8px; }
main { flex: 1; }
.composer, .post { background: #fff; padding: 16px; border-radius: 8px; margin-bottom: 16px; }
.composer input[type=text], .composer textarea { width: 100%; box-sizing: border-box; margin-bottom: 8px; }
.dropzone { border: 2px dashed #ccc; padding: 12px; border-radius: 8px; }
.dropzone.dragging { border-color: #1877f2; background: #e7f0fd; }
.composer-footer { display: flex; justify-content: space-between; margin-top: 8px; }
.error { color: #c0392b; }
.preview { position: relative; margin-top: 8px; }
.preview img, .preview video { max-width: 100%; max-height: 240px; border-radius: 8px; }
.composer.busy { opacity: 0.6; }
.post img, .post video { max-width: 100%; border-radius: 8px; }
</style>
"#;

const SCRIPT: &str = r#"<script>
(function () {
  function localize(el) {
    var d = new Date(el.getAttribute('datetime'));
    if (!isNaN(d)) { el.textContent = d.toLocaleString(); }
  }
  document.querySelectorAll('time[datetime]').forEach(localize);

  var form = document.getElementById('composer');
  var body = document.getElementById('composer-body');
  var counter = document.getElementById('char-count');
  var share = document.getElementById('composer-share');
  var max = parseInt(body.dataset.maxChars, 10);
  // Limit counts code points, matching the server, not UTF-16 units.
  body.addEventListener('input', function () {
    var chars = Array.from(body.value);
    if (chars.length > max) {
      chars = chars.slice(0, max);
      body.value = chars.join('');
    }
    counter.textContent = chars.length + '/' + max;
  });
  body.addEventListener('keydown', function (e) {
    if ((e.metaKey || e.ctrlKey) && e.key === 'Enter') { e.preventDefault(); form.requestSubmit(); }
  });

  var busy = false;
  form.addEventListener('submit', function (e) {
    if (busy) { e.preventDefault(); return; }
    busy = true;
    share.textContent = 'Sharing...';
    form.classList.add('busy');
    // Controls are disabled after the form data set has been built.
    setTimeout(function () {
      Array.from(form.elements).forEach(function (el) { el.disabled = true; });
    }, 0);
  });

  var zone = document.getElementById('dropzone');
  var input = document.getElementById('composer-file');
  var preview = document.getElementById('composer-preview');
  var previewUrl = null;
  function releasePreview() {
    if (previewUrl) { URL.revokeObjectURL(previewUrl); previewUrl = null; }
    preview.replaceChildren();
    preview.hidden = true;
  }
  function showPreview() {
    releasePreview();
    var file = input.files[0];
    if (!file) { return; }
    previewUrl = URL.createObjectURL(file);
    var media = document.createElement(file.type.indexOf('image/') === 0 ? 'img' : 'video');
    media.src = previewUrl;
    if (media.tagName === 'VIDEO') { media.controls = true; }
    var remove = document.createElement('button');
    remove.type = 'button';
    remove.textContent = 'Remove media';
    remove.addEventListener('click', function () {
      input.value = '';
      releasePreview();
    });
    preview.appendChild(media);
    preview.appendChild(remove);
    preview.hidden = false;
  }
  input.addEventListener('change', showPreview);
  window.addEventListener('pagehide', releasePreview);
  zone.addEventListener('dragenter', function (e) { e.preventDefault(); zone.classList.add('dragging'); });
  zone.addEventListener('dragover', function (e) { e.preventDefault(); });
  zone.addEventListener('dragleave', function (e) {
    if (e.target === zone) { zone.classList.remove('dragging'); }
  });
  zone.addEventListener('drop', function (e) {
    e.preventDefault();
    zone.classList.remove('dragging');
    if (e.dataTransfer.files.length > 0) {
      var dt = new DataTransfer();
      dt.items.add(e.dataTransfer.files[0]);
      input.files = dt.files;
      showPreview();
    }
  });

  function text(tag, value) { var el = document.createElement(tag); el.textContent = value; return el; }
  var feed = document.getElementById('feed');
  var source = new EventSource('/api/v1/posts/stream');
  source.addEventListener('post', function (event) {
    var post = JSON.parse(event.data);
    var article = document.createElement('article');
    article.className = 'post';
    article.dataset.id = post.id;
    var header = document.createElement('header');
    header.appendChild(text('strong', post.uploaderName));
    header.appendChild(document.createTextNode(' '));
    var time = document.createElement('time');
    time.setAttribute('datetime', post.timestamp);
    localize(time);
    header.appendChild(time);
    article.appendChild(header);
    if (post.body) { article.appendChild(text('p', post.body)); }
    if (post.mediaUrl) {
      var media = document.createElement(post.mediaType === 'image' ? 'img' : 'video');
      media.src = post.mediaUrl;
      if (post.mediaType !== 'image') { media.controls = true; }
      article.appendChild(media);
    }
    var del = document.createElement('form');
    del.method = 'post';
    del.action = '/posts/' + encodeURIComponent(post.id) + '/delete';
    del.appendChild(text('button', 'Delete'));
    article.appendChild(del);
    var next = Array.from(feed.children).find(function (el) {
      var t = el.querySelector('time');
      return t && new Date(t.getAttribute('datetime')) <= new Date(post.timestamp);
    });
    feed.insertBefore(article, next || null);
  });
})();
</script>
"#;

use activities_core::capabilities::{HttpError, HttpMethod, HttpOperation, HttpResponse, HttpResult};
use activities_core::{
    Activity, ActivityFields, ActivityId, App, Effect, Event, Field, Model,
};
use crux_core::testing::AppTester;
use crux_core::App as _;

fn aid(s: &str) -> ActivityId {
    ActivityId::new(s).unwrap()
}

fn http_requests(effects: Vec<Effect>) -> Vec<crux_core::Request<HttpOperation>> {
    effects
        .into_iter()
        .filter_map(|e| match e {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

fn navigation_paths(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Navigate(request) => Some(request.operation.path.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn submitting_a_new_draft_creates_and_navigates() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::EditorOpened { id: None }, &mut model);
    for (field, value) in [
        (Field::Title, "Run"),
        (Field::Category, "social"),
        (Field::Date, "2024-05-01T10:00"),
        (Field::City, "Leeds"),
        (Field::Venue, "Park"),
    ] {
        app.update(
            Event::FieldChanged {
                field,
                value: value.into(),
            },
            &mut model,
        );
    }

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(model.cache.submitting);

    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    let submitted: Activity = {
        let HttpOperation::Execute(http) = &requests[0].operation;
        assert_eq!(http.method(), HttpMethod::Post);
        assert_eq!(http.path(), "/api/activities");
        serde_json::from_slice(http.body().unwrap()).unwrap()
    };
    assert!(!submitted.id.as_str().is_empty());
    assert_eq!(submitted.fields.title, "Run");
    assert_eq!(submitted.fields.category, "social");
    assert_eq!(submitted.fields.description, "");
    assert_eq!(submitted.fields.date, "2024-05-01T10:00");
    assert_eq!(submitted.fields.city, "Leeds");
    assert_eq!(submitted.fields.venue, "Park");

    let result: HttpResult = Ok(HttpResponse::new(200, Vec::new()));
    let update = app.resolve(&mut requests[0], result).expect("resolves create");

    let mut navigations = Vec::new();
    for event in update.events {
        let update = app.update(event, &mut model);
        navigations.extend(navigation_paths(&update.effects));
    }

    assert!(!model.cache.submitting);
    assert_eq!(model.cache.len(), 1);
    let canonical = model.cache.get(&submitted.id).expect("entry under generated id");
    assert_eq!(canonical, &submitted);
    assert_eq!(navigations, vec![format!("/activities/{}", submitted.id)]);
}

#[test]
fn editing_an_existing_activity_issues_a_put() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    model.cache.insert_and_select(Activity {
        id: aid("a1"),
        fields: ActivityFields {
            title: "Run".into(),
            city: "Leeds".into(),
            ..ActivityFields::default()
        },
    });

    // Cache hit: opening the editor issues no fetch.
    let update = app.update(Event::EditorOpened { id: Some(aid("a1")) }, &mut model);
    assert!(http_requests(update.effects).is_empty());
    let form = App.view(&model).form.expect("form for cached activity");
    assert_eq!(form.id.as_deref(), Some("a1"));
    assert!(!form.is_new);

    app.update(
        Event::FieldChanged {
            field: Field::Title,
            value: "Jog".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitRequested, &mut model);
    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    let submitted: Activity = {
        let HttpOperation::Execute(http) = &requests[0].operation;
        assert_eq!(http.method(), HttpMethod::Put);
        assert_eq!(http.path(), "/api/activities/a1");
        serde_json::from_slice(http.body().unwrap()).unwrap()
    };
    assert_eq!(submitted.id, aid("a1"));
    assert_eq!(submitted.fields.title, "Jog");

    let result: HttpResult = Ok(HttpResponse::new(200, Vec::new()));
    let update = app.resolve(&mut requests[0], result).expect("resolves edit");

    let mut navigations = Vec::new();
    for event in update.events {
        let update = app.update(event, &mut model);
        navigations.extend(navigation_paths(&update.effects));
    }

    // The canonical entry is replaced in place, field for field.
    assert_eq!(model.cache.len(), 1);
    assert_eq!(model.cache.get(&aid("a1")).unwrap(), &submitted);
    assert_eq!(navigations, vec!["/activities/a1".to_string()]);
}

#[test]
fn failed_submit_preserves_the_draft_for_retry() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::EditorOpened { id: None }, &mut model);
    app.update(
        Event::FieldChanged {
            field: Field::Title,
            value: "Run".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitRequested, &mut model);
    let mut requests = http_requests(update.effects);

    let result: HttpResult = Err(HttpError::Timeout { timeout_ms: 60_000 });
    let update = app.resolve(&mut requests[0], result).expect("resolves create");

    let mut navigations = Vec::new();
    for event in update.events {
        let update = app.update(event, &mut model);
        navigations.extend(navigation_paths(&update.effects));
    }

    // submitting returning to false is the recovery signal; the draft and
    // the canonical map are exactly as before, and nothing navigates.
    assert!(!model.cache.submitting);
    assert!(model.cache.is_empty());
    assert!(navigations.is_empty());
    let view = App.view(&model);
    let form = view.form.expect("draft survives the failure");
    assert_eq!(form.fields.title, "Run");
    assert!(form.is_new);
    assert!(view.error.is_some());
}

#[test]
fn a_retried_create_stays_a_create() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::EditorOpened { id: None }, &mut model);
    app.update(
        Event::FieldChanged {
            field: Field::Title,
            value: "Run".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitRequested, &mut model);
    let mut requests = http_requests(update.effects);
    let result: HttpResult = Err(HttpError::Network {
        message: "offline".into(),
    });
    let update = app.resolve(&mut requests[0], result).expect("resolves create");
    for event in update.events {
        app.update(event, &mut model);
    }

    let update = app.update(Event::SubmitRequested, &mut model);
    let requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);
    let HttpOperation::Execute(http) = &requests[0].operation;
    assert_eq!(http.method(), HttpMethod::Post);
}

#[test]
fn reopening_the_editor_does_not_clobber_the_draft() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::EditorOpened { id: None }, &mut model);
    app.update(
        Event::FieldChanged {
            field: Field::Title,
            value: "Run".into(),
        },
        &mut model,
    );

    // An unrelated re-mount fires the open event again.
    app.update(Event::EditorOpened { id: None }, &mut model);

    let form = App.view(&model).form.expect("draft still present");
    assert_eq!(form.fields.title, "Run");
    assert!(form.dirty);
}

#[test]
fn the_editor_fetches_an_uncached_activity_before_showing_the_form() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    let update = app.update(Event::EditorOpened { id: Some(aid("a9")) }, &mut model);

    assert!(model.cache.loading_initial);
    assert!(App.view(&model).form.is_none());

    let mut requests = http_requests(update.effects);
    assert_eq!(requests.len(), 1);

    let activity = Activity {
        id: aid("a9"),
        fields: ActivityFields {
            title: "Museum visit".into(),
            ..ActivityFields::default()
        },
    };
    let body = serde_json::to_vec(&activity).unwrap();
    let result: HttpResult = Ok(HttpResponse::new(200, body));
    let update = app.resolve(&mut requests[0], result).expect("resolves fetch");
    for event in update.events {
        app.update(event, &mut model);
    }

    assert!(!model.cache.loading_initial);
    let form = App.view(&model).form.expect("form after fetch");
    assert_eq!(form.id.as_deref(), Some("a9"));
    assert_eq!(form.fields.title, "Museum visit");
    assert!(!form.dirty);
}

#[test]
fn a_second_submit_while_one_is_in_flight_is_ignored() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    app.update(Event::EditorOpened { id: None }, &mut model);
    app.update(
        Event::FieldChanged {
            field: Field::Title,
            value: "Run".into(),
        },
        &mut model,
    );

    let update = app.update(Event::SubmitRequested, &mut model);
    assert_eq!(http_requests(update.effects).len(), 1);

    let update = app.update(Event::SubmitRequested, &mut model);
    assert!(http_requests(update.effects).is_empty());
    assert!(model.cache.submitting);
}

#[test]
fn closing_the_editor_clears_the_selection() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    model.cache.insert_and_select(Activity {
        id: aid("a1"),
        fields: ActivityFields::default(),
    });
    app.update(Event::EditorOpened { id: Some(aid("a1")) }, &mut model);

    app.update(Event::EditorClosed, &mut model);

    assert!(model.cache.selected_activity().is_none());
    assert!(model.cache.contains(&aid("a1")));
    assert!(App.view(&model).form.is_none());
}

diesel::table! {
    demo_files (demo_id) {
        demo_id -> Uuid,
        file_name -> Text,
        map -> Nullable<Text>,
        server_name -> Nullable<Text>,
        source -> Nullable<Text>,
        tick_rate -> Int4,
        total_ticks -> Int4,
        processed_at -> Timestamp,
    }
}

diesel::table! {
    matches (demo_id, match_id) {
        demo_id -> Uuid,
        match_id -> Int4,
        map -> Nullable<Text>,
        start_tick -> Int4,
        end_tick -> Nullable<Int4>,
        total_rounds -> Int4,
        start_ct_score -> Int4,
        start_t_score -> Int4,
        is_overtime -> Bool,
        is_finished -> Bool,
        winner -> Nullable<Int2>,
        win_condition -> Nullable<Text>,
        max_rounds -> Int4,
        data -> Jsonb,
    }
}

diesel::table! {
    rounds (demo_id, round_id) {
        demo_id -> Uuid,
        round_id -> Int4,
        match_id -> Int4,
        round_number -> Int4,
        start_tick -> Int4,
        end_tick -> Nullable<Int4>,
        winner -> Nullable<Int2>,
        end_reason -> Nullable<Text>,
        ct_score -> Int4,
        t_score -> Int4,
        is_warmup -> Bool,
        is_knife -> Bool,
        data -> Jsonb,
    }
}

diesel::table! {
    players (demo_id, player_key) {
        demo_id -> Uuid,
        player_key -> Int4,
        steam_id -> Nullable<Int8>,
        name -> Text,
        team -> Int2,
        is_bot -> Bool,
        is_hltv -> Bool,
        is_connected -> Bool,
        data -> Jsonb,
    }
}

diesel::table! {
    facts (demo_id, seq) {
        demo_id -> Uuid,
        seq -> Int8,
        kind -> Text,
        match_id -> Nullable<Int4>,
        round_id -> Nullable<Int4>,
        tick -> Int4,
        game_time -> Float4,
        player -> Nullable<Int4>,
        other_player -> Nullable<Int4>,
        unresolved -> Bool,
        data -> Jsonb,
    }
}

diesel::table! {
    round_aggregates (demo_id, round_id, kind, ordinal) {
        demo_id -> Uuid,
        round_id -> Int4,
        kind -> Text,
        ordinal -> Int4,
        player -> Nullable<Int4>,
        team -> Nullable<Int2>,
        data -> Jsonb,
    }
}

diesel::table! {
    match_aggregates (demo_id, match_id, kind, player) {
        demo_id -> Uuid,
        match_id -> Int4,
        kind -> Text,
        player -> Int4,
        rating -> Float4,
        data -> Jsonb,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    demo_files,
    matches,
    rounds,
    players,
    facts,
    round_aggregates,
    match_aggregates,
);

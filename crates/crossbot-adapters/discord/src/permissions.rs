//! Permission bitfield decoding.

const FLAGS: &[(u32, &str)] = &[
    (0, "CreateInstantInvite"),
    (1, "KickMembers"),
    (2, "BanMembers"),
    (3, "Administrator"),
    (4, "ManageChannels"),
    (5, "ManageGuild"),
    (6, "AddReactions"),
    (7, "ViewAuditLog"),
    (8, "PrioritySpeaker"),
    (9, "Stream"),
    (10, "ViewChannel"),
    (11, "SendMessages"),
    (12, "SendTTSMessages"),
    (13, "ManageMessages"),
    (14, "EmbedLinks"),
    (15, "AttachFiles"),
    (16, "ReadMessageHistory"),
    (17, "MentionEveryone"),
    (18, "UseExternalEmojis"),
    (19, "ViewGuildInsights"),
    (20, "Connect"),
    (21, "Speak"),
    (22, "MuteMembers"),
    (23, "DeafenMembers"),
    (24, "MoveMembers"),
    (25, "UseVAD"),
    (26, "ChangeNickname"),
    (27, "ManageNicknames"),
    (28, "ManageRoles"),
    (29, "ManageWebhooks"),
    (30, "ManageGuildExpressions"),
    (31, "UseApplicationCommands"),
    (32, "RequestToSpeak"),
    (33, "ManageEvents"),
    (34, "ManageThreads"),
    (35, "CreatePublicThreads"),
    (36, "CreatePrivateThreads"),
    (37, "UseExternalStickers"),
    (38, "SendMessagesInThreads"),
    (39, "UseEmbeddedActivities"),
    (40, "ModerateMembers"),
];

/// Names of every flag set in `bits`, in bit order. Unknown bits are dropped.
pub fn flag_names(bits: u64) -> Vec<String> {
    FLAGS
        .iter()
        .filter(|(bit, _)| bits & (1u64 << bit) != 0)
        .map(|(_, name)| (*name).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_names() {
        assert!(flag_names(0).is_empty());
        assert_eq!(flag_names(0b110), vec!["KickMembers", "BanMembers"]);
        assert_eq!(flag_names(1 << 40 | 1 << 60), vec!["ModerateMembers"]);
    }
}

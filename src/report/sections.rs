//! Fixed report section templates.

/// A named analytical statement with its narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionTemplate {
    pub title: &'static str,
    pub statement: &'static str,
    pub description: &'static str,
    pub insight: &'static str,
    pub recommendation: &'static str,
}

pub static ANALYTICAL_SECTIONS: [SectionTemplate; 10] = [
    SectionTemplate {
        title: "Users Without Group Membership",
        statement: "MATCH (u:User) WHERE NOT (u)-[:MEMBER_OF]->(:Group) \
                    RETURN u.id AS userId, u.displayName AS displayName ORDER BY displayName",
        description: "Accounts that belong to no group.",
        insight: "Ungrouped accounts usually fall outside group-based access policies and reviews.",
        recommendation: "Confirm each account is still needed and place it in the group matching its function.",
    },
    SectionTemplate {
        title: "Users Without Roles",
        statement: "MATCH (u:User) WHERE NOT (u)-[:HAS_ROLE]->(:Role) \
                    RETURN u.id AS userId, u.displayName AS displayName ORDER BY displayName",
        description: "Accounts with no directory role assigned.",
        insight: "These accounts rely only on default permissions, or are stale.",
        recommendation: "Review with the account owners and disable accounts that are no longer used.",
    },
    SectionTemplate {
        title: "Privileged Role Holders",
        statement: "MATCH (u:User)-[:HAS_ROLE]->(r:Role) \
                    WHERE toLower(coalesce(r.roleName, r.displayName, '')) CONTAINS 'admin' \
                    RETURN u.id AS userId, u.displayName AS user, coalesce(r.roleName, r.displayName) AS role \
                    ORDER BY role, user",
        description: "Users holding an administrative role.",
        insight: "Every administrator widens the blast radius of a compromised account.",
        recommendation: "Keep administrators to the minimum and prefer just-in-time elevation.",
    },
    SectionTemplate {
        title: "Users With Multiple Roles",
        statement: "MATCH (u:User)-[:HAS_ROLE]->(r:Role) \
                    WITH u, collect(coalesce(r.roleName, r.displayName)) AS roles \
                    WHERE size(roles) > 1 \
                    RETURN u.displayName AS user, size(roles) AS roleCount, roles ORDER BY roleCount DESC",
        description: "Users that hold more than one role.",
        insight: "Accumulated roles are a common source of privilege creep and separation-of-duty conflicts.",
        recommendation: "Check each combination against the user's current job and remove roles no longer required.",
    },
    SectionTemplate {
        title: "Empty Groups",
        statement: "MATCH (g:Group) WHERE NOT (:User)-[:MEMBER_OF]->(g) \
                    RETURN g.id AS groupId, g.displayName AS group ORDER BY group",
        description: "Groups with no user members.",
        insight: "Empty groups clutter the directory and may still carry role or resource grants.",
        recommendation: "Delete unused groups or document why they are kept.",
    },
    SectionTemplate {
        title: "Largest Groups",
        statement: "MATCH (u:User)-[:MEMBER_OF]->(g:Group) \
                    RETURN g.displayName AS group, count(u) AS members ORDER BY members DESC LIMIT 10",
        description: "The ten groups with the most members.",
        insight: "Grants on large groups reach many people at once.",
        recommendation: "Audit the permissions attached to these groups first.",
    },
    SectionTemplate {
        title: "Role Distribution",
        statement: "MATCH (r:Role) OPTIONAL MATCH (u:User)-[:HAS_ROLE]->(r) \
                    RETURN coalesce(r.roleName, r.displayName) AS role, count(u) AS holders ORDER BY holders DESC",
        description: "How many users hold each role.",
        insight: "Roles with no holders are candidates for cleanup; roles with many holders deserve scrutiny.",
        recommendation: "Retire unused roles and review the membership of the most widely held ones.",
    },
    SectionTemplate {
        title: "Departments Without AD Groups",
        statement: "MATCH (d:Department) WHERE NOT (d)-[:HAS_AD_GROUP]->(:Group) \
                    RETURN d.name AS department ORDER BY department",
        description: "Departments that are not linked to any directory group.",
        insight: "Access for these departments cannot be granted or revoked through group membership.",
        recommendation: "Link each department to the group that represents it.",
    },
    SectionTemplate {
        title: "Users Without Department",
        statement: "MATCH (u:User) WHERE NOT (u)-[:BELONGS_TO_DEPARTMENT]->(:Department) \
                    RETURN u.id AS userId, u.displayName AS user ORDER BY user",
        description: "Users not assigned to any department.",
        insight: "Without a department, ownership and access reviews have no accountable manager.",
        recommendation: "Assign every active user to a department.",
    },
    SectionTemplate {
        title: "Groups Holding Roles",
        statement: "MATCH (g:Group)-[:HAS_ROLE]->(r:Role) \
                    RETURN g.displayName AS group, collect(coalesce(r.roleName, r.displayName)) AS roles \
                    ORDER BY group",
        description: "Groups that grant roles to all their members.",
        insight: "Role-assignable groups pass privileges on to every member, including nested ones.",
        recommendation: "Restrict who can change membership of these groups.",
    },
];

/// Plain entity dumps appended after the analytical sections.
pub static BASELINE_SECTIONS: [SectionTemplate; 4] = [
    SectionTemplate {
        title: "All Users",
        statement: "MATCH (u:User) RETURN u",
        description: "Every user in the graph.",
        insight: "Baseline inventory of identities.",
        recommendation: "Compare against the HR roster to find orphaned accounts.",
    },
    SectionTemplate {
        title: "All Groups",
        statement: "MATCH (g:Group) RETURN g",
        description: "Every group in the graph.",
        insight: "Baseline inventory of groups.",
        recommendation: "Make sure each group has a named owner.",
    },
    SectionTemplate {
        title: "All Roles",
        statement: "MATCH (r:Role) RETURN r",
        description: "Every role in the graph.",
        insight: "Baseline inventory of roles.",
        recommendation: "Confirm custom roles are still required.",
    },
    SectionTemplate {
        title: "All Departments",
        statement: "MATCH (d:Department) RETURN d",
        description: "Every department in the graph.",
        insight: "Baseline inventory of departments.",
        recommendation: "Keep department records aligned with the organisation chart.",
    },
];

/// Every section in report order.
pub fn all_sections() -> impl Iterator<Item = &'static SectionTemplate> {
    ANALYTICAL_SECTIONS.iter().chain(BASELINE_SECTIONS.iter())
}
